pub mod decoders;
pub mod mime;

pub use mime::decode;
