pub mod message;
pub mod metadata;
pub mod record;

pub use message::{ParsedMessage, RawMessage};
pub use metadata::Metadata;
pub use record::{CanonicalRecord, RecordContext};
