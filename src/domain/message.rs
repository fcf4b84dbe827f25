use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::MessageError;

/// Bytes of one stored message plus where they came from.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl RawMessage {
    pub fn read(path: &Path) -> Result<Self, MessageError> {
        let bytes = std::fs::read(path).map_err(|e| MessageError::Read(path.to_path_buf(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }
}

/// Structural fields recovered from a message by the MIME decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMessage {
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: Option<String>,
    pub sent_date: Option<DateTime<Utc>>,
    pub received_date_hint: Option<DateTime<Utc>>,
    pub body_text: String,
    pub attachment_names: Vec<String>,
}
