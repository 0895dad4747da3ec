//! Decoding and filtering of push-stream payloads.
//!
//! The backend's vision and narration pipelines both speak through the same
//! stream, and neither is perfectly disciplined about payload shape: step
//! checks arrive as objects, plain JSON strings, or markdown-fenced JSON
//! strings, and step-check JSON occasionally leaks onto the speech channel.
//! Everything here is pure so it can be tested without a server.

use serde_json::Value;

use shared::protocol::StepCheck;

/// Decode a step-check payload, trying each shape the backend emits.
/// Returns `None` when no shape fits; callers drop such frames.
pub fn decode_step_check(data: &Value) -> Option<StepCheck> {
    match data {
        Value::Object(_) => serde_json::from_value(data.clone()).ok(),
        Value::String(raw) => {
            let stripped = strip_code_fences(raw);
            serde_json::from_str(stripped.trim()).ok()
        }
        _ => None,
    }
}

/// Remove a surrounding markdown code fence (```json ... ``` or ``` ... ```)
/// if present. Text without a fence passes through untouched.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    match body.split_once('\n') {
        Some((first, tail)) if !first.trim().is_empty() && !first.trim_start().starts_with('{') => {
            tail.trim()
        }
        _ => body.trim(),
    }
}

/// Heuristic for speech payloads that are really misrouted step-check JSON.
///
/// Both lists are configurable because the shapes the narration model leaks
/// have changed across backend revisions.
#[derive(Debug, Clone)]
pub struct SpeechFilter {
    /// A payload starting with any of these is discarded outright.
    pub payload_prefixes: Vec<String>,
    /// A payload that parses as a JSON object containing any of these keys
    /// is discarded.
    pub payload_keys: Vec<String>,
}

impl Default for SpeechFilter {
    fn default() -> Self {
        Self {
            payload_prefixes: vec!["{".into(), "[".into(), "```".into()],
            payload_keys: vec!["completed".into(), "state".into(), "action".into()],
        }
    }
}

impl SpeechFilter {
    /// True when `text` should be dropped rather than spoken or displayed.
    pub fn looks_like_step_check(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if self
            .payload_prefixes
            .iter()
            .any(|p| trimmed.starts_with(p.as_str()))
        {
            return true;
        }
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            return self.payload_keys.iter().any(|k| map.contains_key(k));
        }
        false
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
