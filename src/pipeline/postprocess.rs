//! Post-processing: turn raw completion text into validated JSON.
//!
//! Models asked for "JSON only" still wrap their answer in a
//! ` ```json ... ``` ` block often enough that the fence has to go before
//! decoding. After that the decoded value is shaped into the response type:
//!
//! 1. Strip the outer code fence (leading fence line, trailing fence line)
//! 2. Decode as JSON
//! 3. Check the shape: a keyed object for the full document, an array of row
//!    objects for the topics-only variant
//!
//! A failure at step 2 or 3 is [`MomExtractError::MalformedLlmOutput`]: the
//! model broke its output contract, which is neither a bad upload nor an
//! infrastructure fault.

use crate::error::MomExtractError;
use crate::output::{ExtractionResult, Row};
use crate::prompts::TOPICS_COVERED;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_LEADING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A```(?:json)?\r?\n").unwrap());
static RE_TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n```\z").unwrap());

/// Remove a leading ` ``` ` / ` ```json ` line and a trailing ` ``` ` line.
///
/// Each fence is removed independently, so a response truncated before its
/// closing fence still loses the opening one. Unfenced text is only trimmed.
pub fn strip_code_fences(input: &str) -> String {
    let s = input.trim();
    let s = RE_LEADING_FENCE.replace(s, "");
    let s = RE_TRAILING_FENCE.replace(&s, "");
    s.trim().to_string()
}

/// Decode cleaned completion text as JSON.
pub fn decode_json(cleaned: &str) -> Result<Value, MomExtractError> {
    serde_json::from_str(cleaned).map_err(|e| MomExtractError::MalformedLlmOutput {
        reason: format!("invalid JSON: {e}"),
    })
}

/// Strip fences, then decode.
pub fn clean_and_decode(raw: &str) -> Result<Value, MomExtractError> {
    decode_json(&strip_code_fences(raw))
}

/// Shape a decoded value into the five-section result.
///
/// Missing or `null` sections become empty arrays; unknown keys are dropped.
pub fn into_extraction_result(value: Value) -> Result<ExtractionResult, MomExtractError> {
    if !value.is_object() {
        return Err(MomExtractError::MalformedLlmOutput {
            reason: format!("expected a JSON object, got {}", json_kind(&value)),
        });
    }
    serde_json::from_value(value).map_err(|e| MomExtractError::MalformedLlmOutput {
        reason: format!("unexpected section shape: {e}"),
    })
}

/// Shape a decoded value into the list of topic rows.
///
/// Accepts a bare array, or an object that kept the `topics_covered` key.
pub fn into_topic_rows(value: Value) -> Result<Vec<Row>, MomExtractError> {
    match value {
        Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| MomExtractError::MalformedLlmOutput {
                reason: format!("expected an array of row objects: {e}"),
            })
        }
        Value::Object(mut map) => match map.remove(TOPICS_COVERED.key) {
            Some(inner @ Value::Array(_)) => into_topic_rows(inner),
            _ => Err(MomExtractError::MalformedLlmOutput {
                reason: "expected a JSON array of topics, got an object".into(),
            }),
        },
        other => Err(MomExtractError::MalformedLlmOutput {
            reason: format!("expected a JSON array, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
