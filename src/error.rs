use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::index::IndexState;

/// An entry under the input root could not be read. Fatal to that subtree only.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("input root {} is not readable", .0.display())]
    Root(PathBuf, #[source] io::Error),
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

/// Anything that abandons a single message. The message is skipped, never retried.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("could not read {}", .0.display())]
    Read(PathBuf, #[source] io::Error),
    #[error("malformed message: {0}")]
    Malformed(#[from] mailparse::MailParseError),
    #[error("unparseable date {input:?}: {reason}")]
    DateParse { input: String, reason: String },
    #[error("content extraction failed: {0}")]
    Extract(String),
}

/// Index transport failures. Logged by the caller, never retried.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("index endpoint not configured or invalid: {0}")]
    Endpoint(String),
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("index responded {status} to {url}")]
    Status { url: String, status: u16 },
    #[error("index client is {0:?}, not ready")]
    NotReady(IndexState),
}
