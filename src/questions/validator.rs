//! Validation of untrusted question payloads.
//!
//! Malformed content is dropped, never raised: the result is simply shorter
//! than requested and the caller decides what that means.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use super::model::{Question, positional_id};
use super::topics::TopicFilter;

/// Minimum length of any question field, in characters.
pub const MIN_FIELD_CHARS: usize = 8;
/// Maximum length of any question field, in characters.
pub const MAX_FIELD_CHARS: usize = 200;

/// Trim and collapse whitespace; `None` if the result is out of bounds.
pub fn normalize_text(value: &str) -> Option<String> {
    let compact = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let len = compact.chars().count();
    (MIN_FIELD_CHARS..=MAX_FIELD_CHARS)
        .contains(&len)
        .then_some(compact)
}

fn field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).and_then(normalize_text)
}

/// The list of raw items in a payload: a bare array or `{questions: [...]}`.
pub fn payload_items(payload: &Value) -> Option<&[Value]> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("questions").and_then(Value::as_array).map(Vec::as_slice),
        _ => None,
    }
}

/// Turns raw payloads into well-formed, de-duplicated question sets.
#[derive(Debug, Clone, Default)]
pub struct ResponseValidator {
    topic_filter: Option<TopicFilter>,
}

impl ResponseValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additionally drop items touching disallowed topics.
    pub fn with_topic_filter(mut self, filter: TopicFilter) -> Self {
        self.topic_filter = Some(filter);
        self
    }

    /// Validate a payload, collecting at most `expected` questions.
    pub fn validate(&self, payload: &Value, expected: usize) -> Vec<Question> {
        match payload_items(payload) {
            Some(items) => self.validate_items(items, expected),
            None => {
                debug!("Payload has no question list");
                Vec::new()
            }
        }
    }

    /// Validate a list of raw items, collecting at most `expected` questions.
    pub fn validate_items(&self, items: &[Value], expected: usize) -> Vec<Question> {
        let mut seen = HashSet::new();
        let mut cleaned = Vec::with_capacity(expected.min(items.len()));

        for item in items {
            if cleaned.len() >= expected {
                break;
            }
            let (Some(prompt), Some(a), Some(b)) =
                (field(item, "prompt"), field(item, "a"), field(item, "b"))
            else {
                continue;
            };
            if let Some(filter) = &self.topic_filter {
                if let Some(topic) = filter.first_match(&prompt, &a, &b) {
                    debug!(prompt = %prompt, topic, "Dropping question on disallowed topic");
                    continue;
                }
            }
            if !seen.insert(prompt.to_lowercase()) {
                continue;
            }
            cleaned.push(Question::new(positional_id(cleaned.len()), prompt, a, b));
        }

        cleaned
    }
}

/// Validate with the default (unfiltered) validator.
pub fn validate(payload: &Value, expected: usize) -> Vec<Question> {
    ResponseValidator::new().validate(payload, expected)
}

/// Strip markdown code fences (optionally tagged `json`) from model output.
pub fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
