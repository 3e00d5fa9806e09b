//! Repairs upstream JSON that carries non-finite number literals.
//!
//! The analysis API serialises pandas frames with Python's `json` module,
//! which writes `NaN`, `Infinity` and `-Infinity` as bare tokens. Those are
//! not JSON, so the raw body goes through [`replace_non_finite_tokens`]
//! before parsing and the parsed tree through [`sanitize_value`] after.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::borrow::Cow;

/// Longest first so `-Infinity` wins over `Infinity`.
const NON_FINITE_TOKENS: [&str; 4] = ["-Infinity", "Infinity", "-NaN", "NaN"];

// ── Textual pass ──────────────────────────────────────────────────────────────

/// Replace every unquoted non-finite literal with `null`.
///
/// Tracks string/escape state so `"NaN"` or `"Infinity War"` inside a string
/// value is left alone. Returns the input borrowed when nothing changed.
pub fn replace_non_finite_tokens(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' => {
                in_string = true;
                i += 1;
            }
            b'-' | b'I' | b'N' if at_token_start(bytes, i) => match token_len(&bytes[i..]) {
                Some(len) => {
                    let buf = out.get_or_insert_with(|| String::with_capacity(raw.len()));
                    buf.push_str(&raw[copied..i]);
                    buf.push_str("null");
                    i += len;
                    copied = i;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&raw[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(raw),
    }
}

fn at_token_start(bytes: &[u8], i: usize) -> bool {
    i == 0 || !is_word_byte(bytes[i - 1])
}

fn token_len(rest: &[u8]) -> Option<usize> {
    NON_FINITE_TOKENS.iter().find_map(|token| {
        let token = token.as_bytes();
        let bounded = !rest.get(token.len()).copied().is_some_and(is_word_byte);
        (rest.starts_with(token) && bounded).then_some(token.len())
    })
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

// ── Structural pass ───────────────────────────────────────────────────────────

/// Walk a parsed tree and null out any number that is not finite.
/// Keys and every other leaf pass through unchanged.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value(v)))
                .collect(),
        ),
        Value::Number(n) if n.as_f64().is_some_and(|f| !f.is_finite()) => Value::Null,
        other => other,
    }
}

pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

// ── Typed field helpers ───────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
}

/// `deserialize_with` target for numeric fields that may arrive as a number,
/// `null`, a numeric string, or a non-finite marker. Anything that is not a
/// finite number becomes `None`.
pub fn deserialize_finite<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(LooseNumber::Number(n)) => finite(n),
        Some(LooseNumber::Text(s)) => s.trim().parse::<f64>().ok().and_then(finite),
        None => None,
    })
}
