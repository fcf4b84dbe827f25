pub mod solr;
pub mod wire;

pub use solr::SolrIndex;

/// `SOLRID_<case>_<n>`
pub type DocumentId = String;

/// Lifecycle of an index client within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Provisioning,
    Ready,
}
