//! Extraction of field metadata from free-form agent replies.
//!
//! Replies may be wrapped in an agent envelope, fenced in markdown or
//! surrounded by prose. The outermost `[...]` span is parsed first; if that
//! fails a repair pass removes trailing commas and raw newlines and the
//! parse is tried once more.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::backend::{BackendError, BackendResult};

/// One per-field record as returned by a collaborator.
///
/// Every field is optional; gaps are filled from the local descriptor.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFieldMetadata {
    pub path: Option<String>,
    pub field_name: Option<String>,
    pub data_name: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub sample_value: Option<String>,
    pub data_type: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_important: Option<bool>,
}

/// Accept any JSON value; non-strings are rendered as JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Accept booleans and their string spellings.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Envelope emitted by `claude --output-format json`.
#[derive(Debug, Deserialize)]
struct ClaudeEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    result: Option<String>,
}

/// Envelope emitted by `gemini --output-format json`.
#[derive(Debug, Deserialize)]
struct GeminiEnvelope {
    response: String,
}

/// Strip a known agent envelope, returning the model text.
fn unwrap_envelope(response: &str) -> BackendResult<String> {
    let trimmed = response.trim();
    if !trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    if let Ok(envelope) = serde_json::from_str::<ClaudeEnvelope>(trimmed) {
        if envelope.kind == "result" {
            let text = envelope.result.unwrap_or_default();
            if envelope.is_error {
                return Err(BackendError::ExitCode {
                    code: 1,
                    stderr: text,
                });
            }
            return Ok(text);
        }
    }

    if let Ok(envelope) = serde_json::from_str::<GeminiEnvelope>(trimmed) {
        return Ok(envelope.response);
    }

    Ok(trimmed.to_string())
}

/// Greedy span from the first `[` to the last `]`.
fn array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Remove commas directly before `]` or `}` and replace raw newlines.
///
/// Commas inside string literals are left alone.
pub fn repair_json(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' || c == '\r' {
            out.push(' ');
            escaped = false;
            continue;
        }

        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..]
                    .iter()
                    .find(|n| !n.is_whitespace())
                    .copied();
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn parse_span(text: &str) -> Option<Vec<RawFieldMetadata>> {
    let span = array_span(text)?;
    serde_json::from_str(span).ok()
}

/// Parse an agent reply into per-field records.
///
/// Returns `JsonExtraction` when neither the raw nor the repaired text
/// yields a JSON array of objects. An empty array is a successful parse;
/// deciding whether it is usable is left to the caller.
pub fn parse_field_metadata(response: &str) -> BackendResult<Vec<RawFieldMetadata>> {
    let text = unwrap_envelope(response)?;

    if let Some(fields) = parse_span(&text) {
        return Ok(fields);
    }

    let repaired = repair_json(&text);
    if let Some(fields) = parse_span(&repaired) {
        tracing::debug!("agent reply parsed after repair");
        return Ok(fields);
    }

    Err(BackendError::JsonExtraction { response: text })
}
