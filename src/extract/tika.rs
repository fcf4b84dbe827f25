use anyhow::{Result, anyhow};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde_json::Value;
use url::Url;

use crate::domain::metadata::MESSAGE_DATE;
use crate::domain::{Metadata, RawMessage};
use crate::error::MessageError;
use crate::extract::ContentExtractor;

/// Tika keys that carry a usable received timestamp, in preference order.
const DATE_KEYS: [&str; 2] = ["dcterms:created", "date"];

/// Extractor backed by a running Tika server (`/tika` and `/meta`).
pub struct TikaExtractor {
    http: Client,
    base: Url,
}

impl TikaExtractor {
    pub fn new(base: &str) -> Result<Self> {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&base).map_err(|e| anyhow!("Invalid tika_url '{base}': {e}"))?;
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    fn put(&self, resource: &str, accept: &str, raw: &RawMessage) -> Result<Response, MessageError> {
        let url = self
            .base
            .join(resource)
            .map_err(|e| MessageError::Extract(e.to_string()))?;
        let resp = self
            .http
            .put(url.clone())
            .header(ACCEPT, accept)
            .body(raw.bytes.clone())
            .send()
            .map_err(|e| MessageError::Extract(format!("{url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(MessageError::Extract(format!(
                "{url} responded {}",
                resp.status()
            )));
        }
        Ok(resp)
    }
}

fn flatten(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(flatten)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl ContentExtractor for TikaExtractor {
    fn extract(&self, raw: &RawMessage, metadata: &mut Metadata) -> Result<String, MessageError> {
        let text = self
            .put("tika", "text/plain", raw)?
            .text()
            .map_err(|e| MessageError::Extract(e.to_string()))?;

        let fields: serde_json::Map<String, Value> = self
            .put("meta", "application/json", raw)?
            .json()
            .map_err(|e| MessageError::Extract(e.to_string()))?;
        for (name, value) in fields {
            metadata.set(name, flatten(value));
        }

        if metadata.get(MESSAGE_DATE).is_none() {
            let received = DATE_KEYS
                .iter()
                .find_map(|k| metadata.get(k))
                .map(str::to_owned);
            if let Some(received) = received {
                metadata.set(MESSAGE_DATE, received);
            }
        }

        Ok(text)
    }
}
