use mailparse::{DispositionType, MailHeaderMap, ParsedMail};

use crate::domain::metadata::CONTENT_TYPE;
use crate::domain::{Metadata, RawMessage};
use crate::error::MessageError;
use crate::extract::ContentExtractor;

const HTML_WIDTH: usize = 100;

/// Extractor that needs no external service: every readable text part at
/// any depth, HTML rendered down to plain text. Attachments are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeExtractor;

impl ContentExtractor for NativeExtractor {
    fn extract(&self, raw: &RawMessage, metadata: &mut Metadata) -> Result<String, MessageError> {
        let mail = mailparse::parse_mail(&raw.bytes)?;

        let mut parts = Vec::new();
        collect_text(&mail, &mut parts)?;

        metadata.set(CONTENT_TYPE, mail.ctype.mimetype.as_str());
        Ok(parts.join("\n"))
    }
}

fn collect_text(part: &ParsedMail<'_>, out: &mut Vec<String>) -> Result<(), MessageError> {
    let declared_attachment = part.headers.get_first_value("Content-Disposition").is_some()
        && matches!(
            part.get_content_disposition().disposition,
            DispositionType::Attachment
        );
    if declared_attachment {
        return Ok(());
    }

    let mime = part.ctype.mimetype.to_ascii_lowercase();
    match mime.as_str() {
        "text/plain" => out.push(part.get_body()?),
        "text/html" => {
            let html = part.get_body()?;
            let text = html2text::from_read(html.as_bytes(), HTML_WIDTH)
                .map_err(|e| MessageError::Extract(e.to_string()))?;
            out.push(text);
        }
        "message/rfc822" if part.subparts.is_empty() => {
            let bytes = part.get_body_raw()?;
            let embedded = mailparse::parse_mail(&bytes)?;
            collect_text(&embedded, out)?;
        }
        _ => {
            for sub in &part.subparts {
                collect_text(sub, out)?;
            }
        }
    }
    Ok(())
}
