use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::discovery::Discovery;
use crate::domain::{CanonicalRecord, RawMessage, RecordContext};
use crate::error::{IndexError, MessageError};
use crate::extract::ContentExtractor;
use crate::index::{DocumentId, SolrIndex};
use crate::mail;
use crate::normalize::{self, Extraction};

pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub extension: String,
    pub workers: usize,
    pub case_id: String,
    pub custodian: String,
}

/// What happened to one message.
#[derive(Debug)]
pub enum Outcome {
    Indexed(DocumentId),
    /// Abandoned before reaching the index.
    Skipped(MessageError),
    /// Normalized, but the index did not take it.
    NotIndexed(IndexError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub indexed: usize,
    pub skipped: usize,
    pub index_failures: usize,
    pub discovery_errors: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Indexed(_) => self.indexed += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::NotIndexed(_) => self.index_failures += 1,
        }
    }

    fn merge(&mut self, other: RunSummary) {
        self.discovered += other.discovered;
        self.indexed += other.indexed;
        self.skipped += other.skipped;
        self.index_failures += other.index_failures;
        self.discovery_errors += other.discovery_errors;
    }
}

/// Decode, extract, normalize and index, one message at a time.
pub struct Worker<'a> {
    root: PathBuf,
    case_id: String,
    custodian: String,
    extractor: &'a dyn ContentExtractor,
    index: SolrIndex,
}

impl<'a> Worker<'a> {
    pub fn new(
        root: &Path,
        case_id: &str,
        custodian: &str,
        extractor: &'a dyn ContentExtractor,
        index: SolrIndex,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            case_id: case_id.to_string(),
            custodian: custodian.to_string(),
            extractor,
            index,
        }
    }

    pub fn process(&self, path: &Path) -> Outcome {
        let record = match self.prepare(path) {
            Ok(record) => record,
            Err(e) => {
                error!("Skipping {}: {e}", path.display());
                return Outcome::Skipped(e);
            }
        };
        match self.index.index(&record) {
            Ok(id) => {
                debug!("{} indexed as {id}", path.display());
                Outcome::Indexed(id)
            }
            Err(e) => {
                error!("{} was not indexed: {e}", path.display());
                Outcome::NotIndexed(e)
            }
        }
    }

    fn prepare(&self, path: &Path) -> Result<CanonicalRecord, MessageError> {
        let raw = RawMessage::read(path)?;
        let parsed = mail::decode(&raw)?;

        let ctx = RecordContext {
            case_id: self.case_id.clone(),
            custodian: self.custodian.clone(),
            original_path: original_path(&self.root, path),
        };

        let mut metadata = normalize::native_fields(&parsed, &ctx);
        let text = self.extractor.extract(&raw, &mut metadata)?;

        normalize::normalize(&parsed, Extraction { text, metadata }, &ctx)
    }
}

/// `path` relative to the input root, or unchanged if it lies elsewhere.
pub fn original_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Provisions the case index, then fans discovered files out to
/// `cfg.workers` threads until discovery is exhausted or `stop` is set.
///
/// Per-message, per-directory and index transport failures are logged and
/// counted; none of them ends the run.
pub fn run(
    cfg: &PipelineConfig,
    extractor: &dyn ContentExtractor,
    index: &SolrIndex,
    stop: &AtomicBool,
) -> Result<RunSummary> {
    index.provision()?;

    let discovery = Discovery::new(&cfg.input_dir, &cfg.extension)?;
    let root = std::fs::canonicalize(&cfg.input_dir)?;
    let workers = cfg.workers.max(1);
    info!(
        "Indexing {} into case {} with {workers} worker(s)",
        root.display(),
        cfg.case_id
    );

    let (tx, rx) = crossbeam::channel::bounded::<PathBuf>(workers * 2);
    let mut summary = RunSummary::default();

    thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let rx = rx.clone();
                let worker = Worker::new(
                    &root,
                    &cfg.case_id,
                    &cfg.custodian,
                    extractor,
                    index.clone(),
                );
                s.spawn(move || {
                    let mut tally = RunSummary::default();
                    for path in rx.iter() {
                        if stop.load(Ordering::SeqCst) {
                            break;
                        }
                        tally.record(&worker.process(&path));
                    }
                    tally
                })
            })
            .collect();
        drop(rx);

        for item in discovery {
            if stop.load(Ordering::SeqCst) {
                warn!("Stop requested, no further files will be dispatched");
                break;
            }
            match item {
                Ok(path) => {
                    summary.discovered += 1;
                    if tx.send(path).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Discovery error: {e}");
                    summary.discovery_errors += 1;
                }
            }
        }
        drop(tx);

        for handle in handles {
            match handle.join() {
                Ok(tally) => summary.merge(tally),
                Err(_) => error!("A worker thread panicked"),
            }
        }
    });

    info!(
        "Run finished: {} discovered, {} indexed, {} skipped, {} not indexed, {} discovery errors",
        summary.discovered,
        summary.indexed,
        summary.skipped,
        summary.index_failures,
        summary.discovery_errors
    );
    Ok(summary)
}
