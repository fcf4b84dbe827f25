use crate::domain::Metadata;

pub const DELETE_ALL: &str = "<delete><query>id:[*TO *]</query></delete>";
pub const COMMIT: &str = "<commit/>";

/// Drops characters that would make the document invalid markup:
/// 0x00-0x09, 0x11-0x12, 0x14-0x1F and 0x7F.
pub fn strip_control_chars(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(*c, '\u{00}'..='\u{09}' | '\u{11}'..='\u{12}' | '\u{14}'..='\u{1F}' | '\u{7F}'))
        .collect()
}

fn escape_attr(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn push_cdata(out: &mut String, value: &str) {
    out.push_str("<![CDATA[");
    // a literal ]]> would close the section early
    out.push_str(&value.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}

/// `<add><doc>` body for one document, id first, then every field in order.
pub fn add_document(id: &str, fields: &Metadata) -> String {
    let mut out = String::with_capacity(256);
    out.push_str("<add><doc><field name=\"id\">");
    out.push_str(id);
    out.push_str("</field>");
    for (name, value) in fields.iter() {
        out.push_str("<field name=\"");
        out.push_str(&escape_attr(name));
        out.push_str("\">");
        push_cdata(&mut out, &strip_control_chars(value));
        out.push_str("</field>");
    }
    out.push_str("</doc></add>");
    out
}
