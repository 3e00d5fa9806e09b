use crate::client::sanitizer::{replace_non_finite_tokens, sanitize_value};
use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde_json::Value;

// ── Body decoding ─────────────────────────────────────────────────────────────

/// Sanitize → parse → normalise → bind to `T`.
///
/// Invalid JSON is a `Parse` error; valid JSON of the wrong shape is a
/// `Validation` error. No partial result is ever returned.
pub fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
    let value = parse_sanitized(url, body)?;
    serde_json::from_value(value).map_err(|e| ApiError::validation(url, e.to_string()))
}

pub fn parse_sanitized(url: &str, body: &str) -> Result<Value, ApiError> {
    let text = replace_non_finite_tokens(body);
    let value: Value = serde_json::from_str(&text).map_err(|source| ApiError::Parse {
        url: url.to_string(),
        source,
    })?;
    Ok(sanitize_value(value))
}

/// Server-side reason from an error payload: `{"message": ...}` or
/// `{"error": ...}`.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(&replace_non_finite_tokens(body)).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
