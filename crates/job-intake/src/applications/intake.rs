//! Transport adapters that turn request payloads into a [`RawSubmission`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use super::domain::{Field, RawSubmission};

/// Body limit applied to the intake routes; résumé uploads dominate the size.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Build a submission from a JSON object. The résumé arrives base64 encoded.
pub fn from_json(body: &Map<String, Value>) -> RawSubmission {
    let mut raw = RawSubmission::new();
    for (key, value) in body {
        let Some(field) = Field::from_key(key) else {
            continue;
        };

        match (field, value) {
            (_, Value::Null) => {}
            (Field::ResumePayload, Value::String(encoded)) => match decode_resume(encoded) {
                Ok(bytes) => raw.set_resume(bytes),
                Err(reason) => raw.mark_undecodable(field, reason),
            },
            (Field::ResumePayload, _) => {
                raw.mark_undecodable(field, "expected a base64 encoded string")
            }
            (_, Value::String(text)) => raw.set(key, text.as_str()),
            (_, Value::Number(number)) => raw.set(key, number.to_string()),
            (_, Value::Bool(_) | Value::Array(_) | Value::Object(_)) => {
                raw.mark_undecodable(field, "expected a string or number")
            }
        }
    }
    raw
}

/// Apply one multipart part. The résumé part carries the raw file bytes.
pub fn apply_part(raw: &mut RawSubmission, name: &str, bytes: &[u8]) {
    let Some(field) = Field::from_key(name) else {
        return;
    };

    if field == Field::ResumePayload {
        raw.set_resume(bytes.to_vec());
        return;
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => raw.set(name, text),
        Err(_) => raw.mark_undecodable(field, "not valid UTF-8 text"),
    }
}

/// Decode a base64 résumé, tolerating a `data:` URI prefix and line-wrapped input.
pub fn decode_resume(encoded: &str) -> Result<Vec<u8>, String> {
    let trimmed = encoded.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(uri) => match uri.split_once(',') {
            Some((meta, data)) if meta.ends_with(";base64") => data,
            _ => return Err("data URI is not base64 encoded".to_string()),
        },
        None => trimmed,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| format!("invalid base64: {err}"))
}
