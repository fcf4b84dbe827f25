pub mod dates;

use crate::domain::metadata::{
    CASE_ID, CUSTODIAN, MESSAGE_CC, MESSAGE_CREATION_DATE, MESSAGE_DATE, MESSAGE_DATE_RECEIVED,
    MESSAGE_FROM, MESSAGE_SUBJECT, MESSAGE_TIME_RECEIVED, MESSAGE_TO, ORIGINAL_PATH, TEXT,
};
use crate::domain::{CanonicalRecord, Metadata, ParsedMessage, RecordContext};
use crate::error::MessageError;

pub const ADDRESS_SEPARATOR: &str = " , ";
const ATTACHMENT_BANNER: &str = "<br/>=====================================<br/>Attachments:<br/><br/>";

/// What a content extractor produced for one message.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub text: String,
    pub metadata: Metadata,
}

pub fn address_line(addresses: &[String]) -> String {
    addresses.join(ADDRESS_SEPARATOR)
}

/// HTML rendition of the decoded body, one `<br/>` per line, followed by
/// a listing of attachment names when there are any.
pub fn render_native_body(body: &str, attachment_names: &[String]) -> String {
    let mut lines: Vec<&str> = body.split('\n').collect();
    while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut out = String::with_capacity(body.len() + 64);
    for line in lines {
        out.push_str(&line.replace('<', "&lt;").replace('>', "&gt;"));
        out.push_str("<br/>");
    }

    if !attachment_names.is_empty() {
        out.push_str(ATTACHMENT_BANNER);
        for name in attachment_names {
            out.push_str(name);
            out.push_str("<br/>");
        }
    }
    out
}

/// Fields the decoder alone can supply. The pipeline hands these to the
/// extractor up front, which may add to or replace them.
pub fn native_fields(parsed: &ParsedMessage, ctx: &RecordContext) -> Metadata {
    let mut fields = Metadata::new();
    fields.set(ORIGINAL_PATH, ctx.original_path.as_str());
    fields.set(
        TEXT,
        render_native_body(&parsed.body_text, &parsed.attachment_names),
    );
    fields.set(MESSAGE_FROM, address_line(&parsed.from));
    if let Some(subject) = &parsed.subject {
        fields.set(MESSAGE_SUBJECT, subject.as_str());
    }
    fields.set(MESSAGE_TO, address_line(&parsed.to));
    fields.set(MESSAGE_CC, address_line(&parsed.cc));
    if let Some(sent) = &parsed.sent_date {
        fields.set(MESSAGE_CREATION_DATE, dates::creation_date(sent));
    }
    fields
}

/// Merges decoder output, extractor output and pipeline context into the
/// record that gets indexed.
///
/// Dates are normalized received first, then sent, each pass overwriting
/// `Message-Date`, `Message-Date-Received` and `Message-Time-Received`. A sent
/// date therefore wins whenever the message has one.
pub fn normalize(
    parsed: &ParsedMessage,
    extraction: Extraction,
    ctx: &RecordContext,
) -> Result<CanonicalRecord, MessageError> {
    let Extraction { text, metadata } = extraction;
    let mut fields = metadata;

    for (name, value) in native_fields(parsed, ctx).iter() {
        fields.set_if_absent(name, value);
    }

    // the extractor's text is what gets indexed
    fields.set(TEXT, text);

    let received = fields
        .get(MESSAGE_DATE)
        .map(str::to_owned)
        .or_else(|| parsed.received_date_hint.as_ref().map(dates::canonical));
    if let Some(received) = received {
        apply_date(&mut fields, &received)?;
    }
    if let Some(sent) = &parsed.sent_date {
        apply_date(&mut fields, &dates::canonical(sent))?;
    }

    fields.set(CUSTODIAN, ctx.custodian.as_str());
    fields.set(CASE_ID, ctx.case_id.as_str());

    Ok(CanonicalRecord { fields })
}

fn apply_date(fields: &mut Metadata, input: &str) -> Result<(), MessageError> {
    if let Some(date) = dates::normalize_date(input)? {
        fields.set(MESSAGE_DATE, date.day.as_str());
        fields.set(MESSAGE_DATE_RECEIVED, date.day);
        fields.set(MESSAGE_TIME_RECEIVED, date.time);
    }
    Ok(())
}
