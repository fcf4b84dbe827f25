use mailparse::{DispositionType, MailHeaderMap, ParsedMail};

use crate::domain::{ParsedMessage, RawMessage};
use crate::error::MessageError;
use crate::mail::decoders::{address_list, decode_subject, header_date, received_date};

/// One node of a message's structure, reduced to what the decoder needs.
/// Opaque parts keep only their metadata, never their bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum PartNode {
    PlainText(String),
    Multipart(Vec<PartNode>),
    Embedded(Box<PartNode>),
    Opaque(OpaquePart),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpaquePart {
    /// Lowercased disposition type, `None` when the header is absent.
    pub disposition: Option<String>,
    pub filename: Option<String>,
}

/// Decodes addressing, subject, dates, body text and attachment names.
pub fn decode(raw: &RawMessage) -> Result<ParsedMessage, MessageError> {
    let mail = mailparse::parse_mail(&raw.bytes)?;
    let headers = &mail.headers;

    let tree = build_tree(&mail)?;
    let mut walk = Walk::default();
    walk.root(&tree);

    Ok(ParsedMessage {
        from: address_list(headers, "From"),
        to: address_list(headers, "To"),
        cc: address_list(headers, "Cc"),
        bcc: address_list(headers, "Bcc"),
        subject: decode_subject(headers),
        sent_date: header_date(headers, "Date"),
        received_date_hint: received_date(headers),
        body_text: walk.body,
        attachment_names: walk.attachments,
    })
}

/// Converts a mailparse tree into [`PartNode`]s, decoding only `text/plain`
/// bodies and unwrapping embedded messages.
pub fn build_tree(part: &ParsedMail<'_>) -> Result<PartNode, MessageError> {
    let mime = part.ctype.mimetype.to_ascii_lowercase();

    if mime == "text/plain" {
        return Ok(PartNode::PlainText(part.get_body()?));
    }

    if mime.starts_with("multipart/") {
        let children = part
            .subparts
            .iter()
            .map(build_tree)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(PartNode::Multipart(children));
    }

    if mime == "message/rfc822" {
        let inner = match part.subparts.first() {
            Some(sub) => build_tree(sub)?,
            None => {
                let bytes = part.get_body_raw()?;
                let embedded = mailparse::parse_mail(&bytes)?;
                build_tree(&embedded)?
            }
        };
        return Ok(PartNode::Embedded(Box::new(inner)));
    }

    Ok(PartNode::Opaque(opaque_part(part)))
}

fn opaque_part(part: &ParsedMail<'_>) -> OpaquePart {
    let disposition = part
        .headers
        .get_first_value("Content-Disposition")
        .map(|_| part.get_content_disposition());

    let filename = disposition
        .as_ref()
        .and_then(|d| d.params.get("filename").cloned())
        .or_else(|| part.ctype.params.get("name").cloned())
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());

    OpaquePart {
        disposition: disposition.map(|d| match d.disposition {
            DispositionType::Inline => "inline".to_string(),
            DispositionType::Attachment => "attachment".to_string(),
            DispositionType::FormData => "form-data".to_string(),
            DispositionType::Extension(other) => other.to_ascii_lowercase(),
        }),
        filename,
    }
}

#[derive(Default)]
struct Walk {
    body: String,
    attachments: Vec<String>,
    seq: usize,
}

impl Walk {
    /// The top level differs from nested containers: every child of a root
    /// multipart gets the full rule set, and an opaque root is ignored.
    fn root(&mut self, node: &PartNode) {
        match node {
            PartNode::Multipart(children) => {
                for child in children {
                    self.visit(child);
                }
            }
            PartNode::Opaque(_) => {}
            other => self.visit(other),
        }
    }

    fn visit(&mut self, node: &PartNode) {
        match node {
            PartNode::PlainText(text) => self.body.push_str(text),
            PartNode::Multipart(children) => {
                // only direct text/plain children count here
                for child in children {
                    if let PartNode::PlainText(text) = child {
                        self.body.push_str(text);
                    }
                }
            }
            PartNode::Embedded(inner) => self.visit(inner),
            PartNode::Opaque(part) => self.attachment(part),
        }
    }

    fn attachment(&mut self, part: &OpaquePart) {
        let synthesized = format!("attach-{}", self.seq);
        self.seq += 1;

        let listed = match part.disposition.as_deref() {
            None => true,
            Some(d) => d.eq_ignore_ascii_case("attachment"),
        };
        if !listed {
            return;
        }

        let name = match &part.filename {
            Some(name) => name.clone(),
            None => {
                log::warn!("attachment without a usable filename, using {synthesized}");
                synthesized
            }
        };
        log::debug!("Adding attachment: {name}");
        self.attachments.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn raw(s: &str) -> RawMessage {
        RawMessage {
            path: PathBuf::from("/in/test.eml"),
            bytes: s.replace('\n', "\r\n").into_bytes(),
        }
    }

    #[test]
    fn single_plain_part_is_the_body() {
        let msg = raw("From: a@x.com\n\
                       To: b@y.com, c@z.com\n\
                       Subject: Hello\n\
                       Date: Fri, 5 Mar 2021 10:00:00 +0000\n\
                       \n\
                       Hello there");
        let parsed = decode(&msg).unwrap();
        assert_eq!(parsed.body_text, "Hello there");
        assert!(parsed.attachment_names.is_empty());
        assert_eq!(parsed.from, vec!["a@x.com"]);
        assert_eq!(parsed.to, vec!["b@y.com", "c@z.com"]);
        assert!(parsed.cc.is_empty());
        assert!(parsed.bcc.is_empty());
        assert_eq!(parsed.subject.as_deref(), Some("Hello"));
        assert_eq!(
            parsed.sent_date.unwrap().to_rfc3339(),
            "2021-03-05T10:00:00+00:00"
        );
        assert_eq!(parsed.received_date_hint, None);
    }

    #[test]
    fn unnamed_attachments_are_numbered_in_order() {
        let msg = raw("Subject: files\n\
                       Content-Type: multipart/mixed; boundary=\"XX\"\n\
                       \n\
                       --XX\n\
                       Content-Type: text/plain\n\
                       \n\
                       see attached\n\
                       --XX\n\
                       Content-Type: application/octet-stream\n\
                       \n\
                       AAAA\n\
                       --XX\n\
                       Content-Type: image/png\n\
                       \n\
                       BBBB\n\
                       --XX\n\
                       Content-Type: application/pdf\n\
                       Content-Disposition: attachment\n\
                       \n\
                       CCCC\n\
                       --XX--\n");
        let parsed = decode(&msg).unwrap();
        assert_eq!(parsed.attachment_names, vec!["attach-0", "attach-1", "attach-2"]);
        assert!(parsed.body_text.contains("see attached"));
    }

    #[test]
    fn inline_parts_are_not_attachments() {
        let msg = raw("Content-Type: multipart/mixed; boundary=\"XX\"\n\
                       \n\
                       --XX\n\
                       Content-Type: image/png\n\
                       Content-Disposition: inline; filename=\"logo.png\"\n\
                       \n\
                       AAAA\n\
                       --XX\n\
                       Content-Type: application/pdf; name=\"report.pdf\"\n\
                       Content-Disposition: attachment; filename=\"report.pdf\"\n\
                       \n\
                       BBBB\n\
                       --XX--\n");
        let parsed = decode(&msg).unwrap();
        assert_eq!(parsed.attachment_names, vec!["report.pdf"]);
    }

    #[test]
    fn content_type_name_is_a_fallback_filename() {
        let msg = raw("Content-Type: multipart/mixed; boundary=\"XX\"\n\
                       \n\
                       --XX\n\
                       Content-Type: application/zip; name=\"bundle.zip\"\n\
                       \n\
                       AAAA\n\
                       --XX--\n");
        let parsed = decode(&msg).unwrap();
        assert_eq!(parsed.attachment_names, vec!["bundle.zip"]);
    }

    #[test]
    fn nested_multipart_contributes_only_direct_plain_children() {
        let msg = raw("Content-Type: multipart/mixed; boundary=\"OUTER\"\n\
                       \n\
                       --OUTER\n\
                       Content-Type: multipart/alternative; boundary=\"INNER\"\n\
                       \n\
                       --INNER\n\
                       Content-Type: text/plain\n\
                       \n\
                       plain version\n\
                       --INNER\n\
                       Content-Type: text/html\n\
                       \n\
                       <p>html version</p>\n\
                       --INNER\n\
                       Content-Type: application/octet-stream\n\
                       \n\
                       AAAA\n\
                       --INNER--\n\
                       --OUTER--\n");
        let parsed = decode(&msg).unwrap();
        assert!(parsed.body_text.contains("plain version"));
        assert!(!parsed.body_text.contains("html version"));
        assert!(parsed.attachment_names.is_empty());
    }

    #[test]
    fn embedded_message_is_unwrapped() {
        let msg = raw("Subject: fwd\n\
                       Content-Type: multipart/mixed; boundary=\"XX\"\n\
                       \n\
                       --XX\n\
                       Content-Type: message/rfc822\n\
                       \n\
                       Subject: original\n\
                       Content-Type: text/plain\n\
                       \n\
                       forwarded words\n\
                       --XX\n\
                       Content-Type: application/octet-stream\n\
                       \n\
                       AAAA\n\
                       --XX--\n");
        let parsed = decode(&msg).unwrap();
        assert!(parsed.body_text.contains("forwarded words"));
        assert_eq!(parsed.attachment_names, vec!["attach-0"]);
        assert_eq!(parsed.subject.as_deref(), Some("fwd"));
    }

    #[test]
    fn opaque_root_has_no_body_and_no_attachments() {
        let msg = raw("Content-Type: application/pdf\n\nAAAA");
        let parsed = decode(&msg).unwrap();
        assert_eq!(parsed.body_text, "");
        assert!(parsed.attachment_names.is_empty());
    }

    #[test]
    fn tree_shape() {
        let bytes = b"Content-Type: multipart/mixed; boundary=\"XX\"\r\n\r\n--XX\r\nContent-Type: text/plain\r\n\r\nhi\r\n--XX\r\nContent-Type: image/gif\r\nContent-Disposition: inline\r\n\r\nGIF\r\n--XX--\r\n";
        let mail = mailparse::parse_mail(bytes).unwrap();
        let tree = build_tree(&mail).unwrap();
        let PartNode::Multipart(children) = tree else {
            panic!("expected multipart root");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], PartNode::PlainText(_)));
        assert_eq!(
            children[1],
            PartNode::Opaque(OpaquePart {
                disposition: Some("inline".to_string()),
                filename: None,
            })
        );
    }
}
