//! Shared PDF object helpers used across multiple modules.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// Extract a text string from a PDF dictionary for a given key.
///
/// Returns `Some(String)` if the key exists and contains a non-empty string,
/// `None` otherwise.
pub fn extract_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .ok()
        .and_then(|v| v.as_str().ok())
        .map(decode_text_string)
        .filter(|s| !s.is_empty())
}

/// Decode the bytes of a PDF text string.
///
/// UTF-16BE (with byte-order mark) and UTF-8 (with BOM) are honoured; anything
/// else is read as UTF-8, lossily.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Encode `text` as a PDF text string object.
///
/// Printable ASCII becomes a literal string; anything else is written as
/// UTF-16BE with a byte-order mark, in hexadecimal form.
pub fn encode_text_string(text: &str) -> Object {
    if text.bytes().all(|b| (0x20..0x7F).contains(&b)) {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Resolve a value that might be inline or a reference to a dictionary.
pub fn resolve_dict<'a>(document: &'a Document, value: &'a Object) -> Option<&'a Dictionary> {
    match value {
        Object::Reference(id) => document.get_object(*id).ok()?.as_dict().ok(),
        other => other.as_dict().ok(),
    }
}

/// Resolve a value that might be inline or a reference to an array.
pub fn resolve_array<'a>(document: &'a Document, value: &'a Object) -> Option<&'a Vec<Object>> {
    match value {
        Object::Reference(id) => document.get_object(*id).ok()?.as_array().ok(),
        other => other.as_array().ok(),
    }
}

/// Return the dictionary stored under `id`, if it is one.
pub fn dict_by_id(document: &Document, id: ObjectId) -> Option<&Dictionary> {
    document.get_object(id).ok()?.as_dict().ok()
}

/// Return the catalog's `/AcroForm` dictionary, inline or indirect.
pub fn acroform(document: &Document) -> Option<&Dictionary> {
    let value = document.catalog().ok()?.get(b"AcroForm").ok()?;
    resolve_dict(document, value)
}

/// Read a name entry as an owned byte vector.
pub fn name_of(dict: &Dictionary, key: &[u8]) -> Option<Vec<u8>> {
    dict.get(key).ok()?.as_name().ok().map(<[u8]>::to_vec)
}
