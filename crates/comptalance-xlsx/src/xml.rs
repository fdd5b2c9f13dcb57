//! Small helpers shared by the reader and the writer

use std::borrow::Cow;
use std::str::FromStr;

use quick_xml::events::BytesStart;

/// Unescaped value of attribute `key`
pub(crate) fn attr_str(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

pub(crate) fn attr_parse<T: FromStr>(e: &BytesStart<'_>, key: &[u8]) -> Option<T> {
    attr_str(e, key).and_then(|v| v.trim().parse().ok())
}

/// `xsd:boolean` attribute: "1"/"true" or "0"/"false"
pub(crate) fn attr_bool(e: &BytesStart<'_>, key: &[u8]) -> Option<bool> {
    attr_str(e, key).and_then(|v| match v.as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    })
}

/// Escape text for use in element content or a double-quoted attribute
pub(crate) fn escape(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

pub(crate) fn bool_attr(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Decode the `_xHHHH_` escapes spreadsheet applications use for
/// characters XML cannot carry (control characters, and `_x005F_` for a
/// literal underscore that would otherwise start an escape).
pub(crate) fn decode_excel_escapes(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match parse_escape(candidate) {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// `_xHHHH_` at the start of `s`
fn parse_escape(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < 7 || bytes[6] != b'_' {
        return None;
    }
    let hex = s.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Inverse of [`decode_excel_escapes`] for text about to be written
pub(crate) fn encode_excel_escapes(s: &str) -> Cow<'_, str> {
    let needs_work = s
        .chars()
        .any(|c| is_unwritable_control(c) || c == '_');
    if !needs_work {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    for (i, c) in s.char_indices() {
        if is_unwritable_control(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else if c == '_' && parse_escape(&s[i..]).is_some() {
            // a literal "_x0041_" must not decode to "A" on the way back
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// A raw CR would come back as LF after attribute/text normalization
fn is_unwritable_control(c: char) -> bool {
    (c as u32) < 0x20 && !matches!(c, '\t' | '\n')
}
