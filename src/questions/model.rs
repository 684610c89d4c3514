//! Question, context and outcome data models.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single A/B preference question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Positional id within its set (`q1`, `q2`, ...).
    pub id: String,
    pub prompt: String,
    pub a: String,
    pub b: String,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            a: a.into(),
            b: b.into(),
        }
    }

    /// Case-insensitive key used for duplicate and exclusion checks.
    pub fn prompt_key(&self) -> String {
        prompt_key(&self.prompt)
    }
}

/// Positional id for the question at `index` (zero-based).
pub fn positional_id(index: usize) -> String {
    format!("q{}", index + 1)
}

/// Reassign ids positionally, in order.
pub fn renumber(questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| Question {
            id: positional_id(i),
            ..q
        })
        .collect()
}

/// Trimmed, whitespace-collapsed, lowercased prompt.
pub fn prompt_key(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// In-progress onboarding profile used to vary and invalidate question sets.
///
/// Field order is the serialization order, and the fingerprint depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(default)]
    pub aviation_term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_give_rides: Option<bool>,
    #[serde(default)]
    pub home_address: String,
    #[serde(default)]
    pub destination_address: String,
}

impl Context {
    /// Build a context from loosely-typed onboarding state, ignoring bad fields.
    pub fn from_state(state: &serde_json::Value) -> Self {
        let text = |key: &str| {
            state
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Self {
            aviation_term: text("aviationTerm"),
            can_give_rides: state.get("canGiveRides").and_then(|v| v.as_bool()),
            home_address: text("homeAddress"),
            destination_address: text("destinationAddress"),
        }
    }

    /// Short stable hash of the serialized context.
    pub fn fingerprint(&self) -> String {
        let serialized = serde_json::to_string(self).unwrap_or_default();
        let digest = Sha256::digest(serialized.as_bytes());
        let hex = format!("{digest:x}");
        hex[..16].to_string()
    }
}

/// Where a question set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOrigin {
    Cache,
    Ai,
    Fallback,
}

impl std::fmt::Display for QuestionOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Ai => write!(f, "ai"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of a full set load, as handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionBatch {
    pub questions: Vec<Question>,
    pub source: QuestionOrigin,
    pub error: Option<String>,
}

/// Result of regenerating one question in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Regenerated {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<QuestionOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Regenerated {
    pub fn replaced(question: Question, source: QuestionOrigin, error: Option<String>) -> Self {
        Self {
            ok: true,
            question: Some(question),
            source: Some(source),
            error,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            question: None,
            source: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_key_normalizes() {
        assert_eq!(prompt_key("  Pick   A\tnow "), "pick a now");
        assert_eq!(prompt_key("Pick A"), prompt_key("pick a"));
    }

    #[test]
    fn renumber_assigns_positional_ids() {
        let qs = vec![
            Question::new("x", "first prompt", "option one", "option two"),
            Question::new("y", "second prompt", "option one", "option two"),
        ];
        let qs = renumber(qs);
        assert_eq!(qs[0].id, "q1");
        assert_eq!(qs[1].id, "q2");
    }

    #[test]
    fn context_serializes_in_declared_order() {
        let ctx = Context {
            aviation_term: "fall".into(),
            can_give_rides: Some(true),
            home_address: "1 Main St".into(),
            destination_address: "Airport".into(),
        };
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(
            json,
            r#"{"aviationTerm":"fall","canGiveRides":true,"homeAddress":"1 Main St","destinationAddress":"Airport"}"#
        );

        let unknown_rides = Context::default();
        let json = serde_json::to_string(&unknown_rides).unwrap();
        assert!(!json.contains("canGiveRides"));
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = Context {
            home_address: "1 Main St".into(),
            ..Default::default()
        };
        let b = a.clone();
        let c = Context {
            home_address: "2 Main St".into(),
            ..Default::default()
        };
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }

    #[test]
    fn context_from_state_is_lenient() {
        let state = serde_json::json!({
            "aviationTerm": "spring",
            "canGiveRides": "yes",
            "homeAddress": 42,
            "destinationAddress": "Campus",
            "extra": true,
        });
        let ctx = Context::from_state(&state);
        assert_eq!(ctx.aviation_term, "spring");
        assert_eq!(ctx.can_give_rides, None);
        assert_eq!(ctx.home_address, "");
        assert_eq!(ctx.destination_address, "Campus");
    }

    #[test]
    fn regenerated_omits_empty_fields() {
        let failed = serde_json::to_value(Regenerated::failed("Unable to regenerate question"))
            .unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"ok": false, "error": "Unable to regenerate question"})
        );

        let q = Question::new("q1", "During rides, you prefer:", "quiet ride", "chatty ride");
        let ok = serde_json::to_value(Regenerated::replaced(q, QuestionOrigin::Ai, None)).unwrap();
        assert_eq!(ok["source"], "ai");
        assert!(ok.get("error").is_none());
    }

    #[test]
    fn batch_serializes_null_error() {
        let batch = QuestionBatch {
            questions: vec![],
            source: QuestionOrigin::Cache,
            error: None,
        };
        let value = serde_json::to_value(batch).unwrap();
        assert_eq!(value["source"], "cache");
        assert!(value["error"].is_null());
    }
}
