/// Ordered name/value bag carried from decoding through to the index.
///
/// Well-known names are the constants below; extractors may add any other
/// name, and those are copied through to the index unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    fields: Vec<(String, String)>,
}

pub const TEXT: &str = "text";
pub const ORIGINAL_PATH: &str = "Original-Path";
pub const CUSTODIAN: &str = "Custodian";
pub const CASE_ID: &str = "Case-Id";
pub const MESSAGE_FROM: &str = "Message-From";
pub const MESSAGE_TO: &str = "Message-To";
pub const MESSAGE_CC: &str = "Message-CC";
pub const MESSAGE_SUBJECT: &str = "Message-Subject";
pub const MESSAGE_CREATION_DATE: &str = "Message-Creation-Date";
/// Also the slot extractors fill with the received timestamp.
pub const MESSAGE_DATE: &str = "Message-Date";
pub const MESSAGE_DATE_RECEIVED: &str = "Message-Date-Received";
pub const MESSAGE_TIME_RECEIVED: &str = "Message-Time-Received";
pub const CONTENT_TYPE: &str = "Content-Type";

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces an existing value in place, keeping its position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn set_if_absent(&mut self, name: &str, value: impl Into<String>) {
        if self.get(name).is_none() {
            self.fields.push((name.to_string(), value.into()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
