use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::domain::CanonicalRecord;
use crate::error::IndexError;
use crate::index::wire;
use crate::index::{DocumentId, IndexState};

/// Solr instance directory every per-case core is created from.
pub const INSTANCE_DIR: &str = "shmcloud";

/// HTTP client for one case's Solr core.
///
/// Clones share the document counter and lifecycle state, so every worker
/// of a run can hold its own clone and ids stay unique across all of them.
#[derive(Clone)]
pub struct SolrIndex {
    http: Client,
    endpoint: Url,
    case_id: String,
    update_url: Url,
    counter: Arc<AtomicU64>,
    state: Arc<Mutex<IndexState>>,
}

impl SolrIndex {
    pub fn new(endpoint: &str, case_id: &str) -> Result<Self, IndexError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(IndexError::Endpoint("empty endpoint".to_string()));
        }
        let with_slash = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let endpoint =
            Url::parse(&with_slash).map_err(|e| IndexError::Endpoint(format!("{endpoint}: {e}")))?;
        let update_url = endpoint
            .join(&format!("{}/update", core_name(case_id)))
            .map_err(|e| IndexError::Endpoint(e.to_string()))?;

        Ok(Self {
            http: Client::new(),
            endpoint,
            case_id: case_id.to_string(),
            update_url,
            counter: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(IndexState::Uninitialized)),
        })
    }

    pub fn state(&self) -> IndexState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_state(&self, next: IndexState) {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = next;
    }

    pub fn update_url(&self) -> &Url {
        &self.update_url
    }

    fn create_core_url(&self) -> Result<Url, IndexError> {
        let core = core_name(&self.case_id);
        let mut url = self
            .endpoint
            .join("admin/cores")
            .map_err(|e| IndexError::Endpoint(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("action", "CREATE")
            .append_pair("name", &core)
            .append_pair("instanceDir", INSTANCE_DIR)
            .append_pair("config", "solrconfig.xml")
            .append_pair("dataDir", &format!("data_{}", self.case_id))
            .append_pair("schema", "schema.xml");
        Ok(url)
    }

    /// Creates the case core if possible, then empties it.
    ///
    /// Transport failures here are logged and never escalated: the client is
    /// `Ready` once provisioning has run. Only an unusable endpoint URL is an
    /// error.
    pub fn provision(&self) -> Result<(), IndexError> {
        self.set_state(IndexState::Provisioning);

        let create = self.create_core_url()?;
        if let Err(e) = self.get(&create) {
            warn!("Unable to create core {}: {e}", core_name(&self.case_id));
            warn!("Core command: {create}");
        }

        if let Err(e) = self.post(wire::DELETE_ALL) {
            error!("Unable to clear index {}: {e}", self.update_url);
        }
        if let Err(e) = self.post(wire::COMMIT) {
            error!("Unable to commit reset of index {}: {e}", self.update_url);
        }

        info!("Index {} ready", self.update_url);
        self.set_state(IndexState::Ready);
        Ok(())
    }

    /// Sends one record as its own document and commits it.
    ///
    /// The id is taken only once the client is ready, so a refused call does
    /// not burn a number.
    pub fn index(&self, record: &CanonicalRecord) -> Result<DocumentId, IndexError> {
        let state = self.state();
        if state != IndexState::Ready {
            return Err(IndexError::NotReady(state));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("SOLRID_{}_{}", self.case_id, n);

        self.post(&wire::add_document(&id, &record.fields))?;
        self.post(wire::COMMIT)?;
        debug!("Indexed {id}");
        Ok(id)
    }

    fn get(&self, url: &Url) -> Result<(), IndexError> {
        let resp = self
            .http
            .get(url.clone())
            .send()
            .map_err(|source| IndexError::Transport {
                url: url.to_string(),
                source,
            })?;
        check_status(url, resp.status().as_u16())
    }

    fn post(&self, body: &str) -> Result<(), IndexError> {
        let url = &self.update_url;
        let resp = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
            .body(body.to_string())
            .send()
            .map_err(|source| {
                error!("Problem sending request to {url}: {source}");
                IndexError::Transport {
                    url: url.to_string(),
                    source,
                }
            })?;
        check_status(url, resp.status().as_u16())
    }
}

fn core_name(case_id: &str) -> String {
    format!("{INSTANCE_DIR}_{case_id}")
}

fn check_status(url: &Url, status: u16) -> Result<(), IndexError> {
    if status == 200 {
        return Ok(());
    }
    error!("Solr Invalid Response: {status} from {url}");
    Err(IndexError::Status {
        url: url.to_string(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Metadata;
    use crate::index::fake::FakeSolr;
    use std::collections::HashSet;

    fn record() -> CanonicalRecord {
        let mut fields = Metadata::new();
        fields.set("Message-Subject", "hello\u{0}");
        fields.set("text", "body\u{7F} text");
        CanonicalRecord { fields }
    }

    #[test]
    fn urls_follow_core_naming() {
        let index = SolrIndex::new("http://localhost:8983/solr", "c1").unwrap();
        assert_eq!(
            index.update_url().as_str(),
            "http://localhost:8983/solr/shmcloud_c1/update"
        );
        assert_eq!(
            index.create_core_url().unwrap().as_str(),
            "http://localhost:8983/solr/admin/cores?action=CREATE&name=shmcloud_c1\
             &instanceDir=shmcloud&config=solrconfig.xml&dataDir=data_c1&schema=schema.xml"
        );
        assert_eq!(index.state(), IndexState::Uninitialized);
    }

    #[test]
    fn empty_endpoint_rejected() {
        assert!(matches!(
            SolrIndex::new("  ", "c1"),
            Err(IndexError::Endpoint(_))
        ));
    }

    #[test]
    fn provision_tolerates_failed_create() {
        let solr = FakeSolr::start(|r| r.url.contains("action=CREATE"));
        let index = SolrIndex::new(&solr.endpoint(), "c1").unwrap();
        index.provision().unwrap();
        assert_eq!(index.state(), IndexState::Ready);

        let reqs = solr.requests();
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].method, "GET");
        assert!(reqs[0].url.starts_with("/solr/admin/cores?action=CREATE&name=shmcloud_c1"));
        assert_eq!(reqs[1].method, "POST");
        assert_eq!(reqs[1].url, "/solr/shmcloud_c1/update");
        assert_eq!(reqs[1].body, "<delete><query>id:[*TO *]</query></delete>");
        assert_eq!(reqs[2].body, "<commit/>");
    }

    #[test]
    fn failed_reset_is_logged_not_escalated() {
        let solr = FakeSolr::start(|r| r.body.starts_with("<delete>"));
        let index = SolrIndex::new(&solr.endpoint(), "c1").unwrap();
        index.provision().unwrap();
        assert_eq!(index.state(), IndexState::Ready);
        assert_eq!(index.index(&record()).unwrap(), "SOLRID_c1_1");

        let reqs = solr.requests();
        let bodies: Vec<&str> = reqs.iter().map(|r| r.body.as_str()).collect();
        assert_eq!(bodies.len(), 5);
        assert!(bodies[1].starts_with("<delete>"));
        assert_eq!(bodies[2], "<commit/>");
        assert!(bodies[3].starts_with("<add>"));
        assert_eq!(bodies[4], "<commit/>");
    }

    #[test]
    fn unreachable_index_still_provisions() {
        let index = SolrIndex::new("http://127.0.0.1:9/solr", "c1").unwrap();
        index.provision().unwrap();
        assert_eq!(index.state(), IndexState::Ready);
        assert!(matches!(
            index.index(&record()),
            Err(IndexError::Transport { .. })
        ));
    }

    #[test]
    fn index_before_provision_is_refused() {
        let index = SolrIndex::new("http://127.0.0.1:9/solr", "c1").unwrap();
        assert!(matches!(
            index.index(&record()),
            Err(IndexError::NotReady(IndexState::Uninitialized))
        ));
    }

    #[test]
    fn add_then_commit_with_clean_payload() {
        let solr = FakeSolr::start(|_| false);
        let index = SolrIndex::new(&solr.endpoint(), "c1").unwrap();
        index.provision().unwrap();

        let first = index.index(&record()).unwrap();
        let second = index.index(&record()).unwrap();
        assert_eq!(first, "SOLRID_c1_1");
        assert_eq!(second, "SOLRID_c1_2");

        let reqs = solr.requests();
        let add = &reqs[3];
        assert!(add.body.starts_with("<add><doc><field name=\"id\">SOLRID_c1_1</field>"));
        assert!(add.body.contains("<![CDATA[hello]]>"));
        assert!(add.body.contains("<![CDATA[body text]]>"));
        assert!(!add.body.contains('\u{0}'));
        assert!(!add.body.contains('\u{7F}'));
        assert_eq!(reqs[4].body, "<commit/>");
    }

    #[test]
    fn rejected_add_is_reported() {
        let solr = FakeSolr::start(|r| r.body.starts_with("<add>"));
        let index = SolrIndex::new(&solr.endpoint(), "c1").unwrap();
        index.provision().unwrap();
        assert!(matches!(
            index.index(&record()),
            Err(IndexError::Status { status: 500, .. })
        ));
        // the id is spent even though the add failed
        let reqs = solr.requests();
        assert!(reqs.last().unwrap().body.contains("SOLRID_c1_1"));
    }

    #[test]
    fn concurrent_callers_get_distinct_ids() {
        let solr = FakeSolr::start(|_| false);
        let index = SolrIndex::new(&solr.endpoint(), "c1").unwrap();
        index.provision().unwrap();

        let ids: Vec<DocumentId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let index = index.clone();
                    s.spawn(move || {
                        (0..5)
                            .map(|_| index.index(&record()).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        assert_eq!(ids.len(), 20);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 20);
        for n in 1..=20 {
            assert!(ids.contains(&format!("SOLRID_c1_{n}")));
        }
    }
}
