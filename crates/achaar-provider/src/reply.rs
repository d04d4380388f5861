//! Reply-shape normalization.
//!
//! Provider replies carry their text in one of several places. Each shape is
//! tried in order and the first non-empty text wins:
//!
//! 1. a top-level `text` string
//! 2. `candidates[0].content.parts[*].text`
//! 3. a nested `response.text` string
//! 4. `response.candidates[0].content.parts[*].text`

use serde_json::Value;

use crate::error::ProviderFailure;

/// Extract the reply text from a provider payload.
///
/// Fails with [`ProviderFailure::ContentBlocked`] when the provider reports a
/// safety block instead of text, and with [`ProviderFailure::InvalidResponse`]
/// when no shape yields text.
pub fn normalize_reply(payload: &Value) -> Result<String, ProviderFailure> {
    let found = direct_text(payload)
        .or_else(|| candidate_text(payload))
        .or_else(|| payload.get("response").and_then(direct_text))
        .or_else(|| payload.get("response").and_then(candidate_text));

    if let Some(text) = found {
        return Ok(text);
    }

    if let Some(reason) = block_reason(payload) {
        return Err(ProviderFailure::ContentBlocked(format!(
            "response blocked: {}",
            reason
        )));
    }

    Err(ProviderFailure::InvalidResponse)
}

fn direct_text(value: &Value) -> Option<String> {
    value
        .get("text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn candidate_text(value: &Value) -> Option<String> {
    let parts = value.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn block_reason(value: &Value) -> Option<String> {
    if let Some(reason) = value
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Some(reason.to_string());
    }
    match value
        .pointer("/candidates/0/finishReason")
        .and_then(Value::as_str)
    {
        Some(reason @ ("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => Some(reason.to_string()),
        _ => None,
    }
}
