use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eml_indexer::config::{Config, load_config, load_config_from};
use eml_indexer::discovery::discover;
use eml_indexer::extract::{ContentExtractor, NativeExtractor, TikaExtractor};
use eml_indexer::index::SolrIndex;
use eml_indexer::pipeline::{PipelineConfig, run};

#[derive(Parser)]
#[command(name = "eml_indexer")]
#[command(about = "Index a tree of .eml messages into Solr", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode, normalize and index every message under the input dir
    Run {
        #[arg(long)]
        input_dir: Option<PathBuf>,

        #[arg(long)]
        solr_url: Option<String>,

        #[arg(long)]
        case_id: Option<String>,

        #[arg(long)]
        custodian: Option<String>,

        #[arg(long)]
        workers: Option<usize>,

        #[arg(long)]
        extension: Option<String>,

        /// Extract text with a Tika server instead of the built-in extractor
        #[arg(long)]
        tika_url: Option<String>,
    },

    /// Only list the files a run would pick up
    Discover {
        #[arg(long)]
        input_dir: Option<PathBuf>,

        #[arg(long)]
        extension: Option<String>,
    },
}

fn load(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => load_config_from(p),
        None => load_config(),
    }
    .map_err(|e| anyhow!("Configuration error: {e}"))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Discover {
            input_dir,
            extension,
        } => {
            let (input_dir, extension) = match (input_dir, extension) {
                (Some(dir), ext) => (dir, ext.unwrap_or_else(|| "eml".to_string())),
                (None, ext) => {
                    let cfg = load(cli.config.as_ref())?;
                    (cfg.input_dir, ext.unwrap_or(cfg.extension))
                }
            };
            let (found, errors) = discover(&input_dir, &extension)?;
            for path in &found {
                println!("{}", path.display());
            }
            for e in &errors {
                eprintln!("Discovery error: {e}");
            }
            Ok(())
        }

        Command::Run {
            input_dir,
            solr_url,
            case_id,
            custodian,
            workers,
            extension,
            tika_url,
        } => {
            let mut cfg = load(cli.config.as_ref())?;
            if let Some(v) = input_dir {
                cfg.input_dir = v;
            }
            if let Some(v) = solr_url {
                cfg.solr_url = v;
            }
            if let Some(v) = case_id {
                cfg.case_id = v;
            }
            if let Some(v) = custodian {
                cfg.custodian = v;
            }
            if let Some(v) = workers {
                cfg.workers = v;
            }
            if let Some(v) = extension {
                cfg.extension = v;
            }
            if tika_url.is_some() {
                cfg.tika_url = tika_url;
            }
            cfg.validate()?;

            let extractor: Box<dyn ContentExtractor> = match &cfg.tika_url {
                Some(url) => Box::new(TikaExtractor::new(url)?),
                None => Box::new(NativeExtractor),
            };
            let index = SolrIndex::new(&cfg.solr_url, &cfg.case_id)?;

            let stop = Arc::new(AtomicBool::new(false));
            let s2 = stop.clone();
            ctrlc::set_handler(move || {
                s2.store(true, Ordering::SeqCst);
            })?;

            let summary = run(
                &PipelineConfig {
                    input_dir: cfg.input_dir,
                    extension: cfg.extension,
                    workers: cfg.workers,
                    case_id: cfg.case_id,
                    custodian: cfg.custodian,
                },
                extractor.as_ref(),
                &index,
                &stop,
            )?;

            println!(
                "{} discovered, {} indexed, {} skipped, {} not indexed, {} discovery errors",
                summary.discovered,
                summary.indexed,
                summary.skipped,
                summary.index_failures,
                summary.discovery_errors
            );
            Ok(())
        }
    }
}
