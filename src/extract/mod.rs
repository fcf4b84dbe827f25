pub mod native;
pub mod tika;

use crate::domain::{Metadata, RawMessage};
use crate::error::MessageError;

pub use native::NativeExtractor;
pub use tika::TikaExtractor;

/// Generic full-text extraction. The returned text is what gets indexed;
/// any metadata the extractor finds is added to `metadata`, and a received
/// timestamp, when known, goes under [`crate::domain::metadata::MESSAGE_DATE`].
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, raw: &RawMessage, metadata: &mut Metadata) -> Result<String, MessageError>;
}
