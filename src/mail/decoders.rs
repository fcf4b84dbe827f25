use chrono::{DateTime, Utc};
use mailparse::{MailAddr, MailHeader, MailHeaderMap};

/// Every address across all occurrences of `name`, each in mailparse's
/// display form. Group syntax is flattened into its member mailboxes. An
/// absent header gives an empty list.
pub fn address_list(headers: &[MailHeader], name: &str) -> Vec<String> {
    let mut out = Vec::new();
    for header in headers.get_all_headers(name) {
        match mailparse::addrparse_header(header) {
            Ok(list) => {
                for addr in list.iter() {
                    match addr {
                        MailAddr::Single(single) => out.push(single.to_string()),
                        MailAddr::Group(group) => {
                            out.extend(group.addrs.iter().map(|a| a.to_string()))
                        }
                    }
                }
            }
            Err(e) => {
                // keep the decoded text rather than losing the recipient
                log::warn!("unparseable {name} header, keeping raw value: {e}");
                let raw = header.get_value();
                let raw = raw.trim();
                if !raw.is_empty() {
                    out.push(raw.to_string());
                }
            }
        }
    }
    out
}

/// Parses an RFC 2822 date header. Absent or unparseable gives `None`.
pub fn header_date(headers: &[MailHeader], name: &str) -> Option<DateTime<Utc>> {
    headers
        .get_first_value(name)
        .and_then(|d| parse_rfc2822(&d))
}

/// The timestamp that closes the topmost `Received:` trace line.
pub fn received_date(headers: &[MailHeader]) -> Option<DateTime<Utc>> {
    let received = headers.get_first_value("Received")?;
    let (_, stamp) = received.rsplit_once(';')?;
    parse_rfc2822(stamp)
}

fn parse_rfc2822(value: &str) -> Option<DateTime<Utc>> {
    let epoch = mailparse::dateparse(value.trim()).ok()?;
    // dateparse yields 0 when it never reached a year, i.e. junk input
    if epoch == 0 {
        log::debug!("ignoring unparseable date {value:?}");
        return None;
    }
    DateTime::from_timestamp(epoch, 0)
}

pub fn decode_subject(headers: &[MailHeader]) -> Option<String> {
    headers.get_first_value("Subject") // decodes RFC 2047 encoded-words
}
