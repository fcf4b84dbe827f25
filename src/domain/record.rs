use crate::domain::metadata::Metadata;

/// Normalized, indexable form of one message. Every field, well-known or
/// extractor-supplied, lives in `fields`; the document id is assigned by the
/// index client when the record is sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRecord {
    pub fields: Metadata,
}

/// Pipeline-level values stamped onto every record.
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub case_id: String,
    pub custodian: String,
    pub original_path: String,
}
