//! Deterministic server-side fallback when generation fails.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::questions::model::{Question, prompt_key, renumber};
use crate::questions::source::Mode;

pub const DEFAULT_COUNT: usize = 10;
pub const MAX_COUNT: usize = 20;

/// Requested count clamped to `1..=20`; anything non-numeric is 10.
pub fn clamp_count(raw: Option<&Value>) -> usize {
    let parsed = match raw {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) => n.clamp(1, MAX_COUNT as i64) as usize,
        None => DEFAULT_COUNT,
    }
}

/// Recursively rebuild objects with their keys in sorted order.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonical(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Seed derived from the canonical `{"context", "regen_seed"}` JSON.
pub fn fallback_seed(context: &Value, regen_seed: &Value) -> u64 {
    let canonical = canonical(&json!({ "context": context, "regen_seed": regen_seed })).to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Shuffle the bank with a context-derived seed and take `count` entries.
///
/// Single mode returns one question whose prompt is not in `exclude_prompts`
/// when such a question exists.
pub fn fallback_questions(
    bank: &[Question],
    count: usize,
    context: &Value,
    regen_seed: &Value,
    mode: Mode,
    exclude_prompts: &[String],
) -> Vec<Question> {
    let mut rng = StdRng::seed_from_u64(fallback_seed(context, regen_seed));
    let mut options = bank.to_vec();
    options.shuffle(&mut rng);

    let picked = match mode {
        Mode::Batch => options.into_iter().take(count).collect(),
        Mode::Single => {
            let excluded: Vec<String> = exclude_prompts.iter().map(|p| prompt_key(p)).collect();
            let fresh = options
                .iter()
                .position(|q| !excluded.contains(&q.prompt_key()))
                .unwrap_or(0);
            options.into_iter().skip(fresh).take(1).collect()
        }
    };
    renumber(picked)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::questions::bank::default_bank;

    #[test]
    fn clamp_count_bounds() {
        assert_eq!(clamp_count(Some(&json!(5))), 5);
        assert_eq!(clamp_count(Some(&json!(0))), 1);
        assert_eq!(clamp_count(Some(&json!(-3))), 1);
        assert_eq!(clamp_count(Some(&json!(50))), 20);
        assert_eq!(clamp_count(Some(&json!("12"))), 12);
        assert_eq!(clamp_count(Some(&json!(7.9))), 7);
    }

    #[test]
    fn clamp_count_defaults_when_not_numeric() {
        assert_eq!(clamp_count(None), 10);
        assert_eq!(clamp_count(Some(&json!("many"))), 10);
        assert_eq!(clamp_count(Some(&json!(null))), 10);
        assert_eq!(clamp_count(Some(&json!([3]))), 10);
    }

    #[test]
    fn seed_depends_on_context_and_regen_seed() {
        let ctx = json!({"homeAddress": "1 Main St"});
        assert_eq!(fallback_seed(&ctx, &json!(0)), fallback_seed(&ctx, &json!(0)));
        assert_ne!(fallback_seed(&ctx, &json!(0)), fallback_seed(&ctx, &json!(1)));
        assert_ne!(fallback_seed(&ctx, &json!(0)), fallback_seed(&json!({}), &json!(0)));
    }

    #[test]
    fn seed_ignores_key_order() {
        let one: Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let two: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert_eq!(fallback_seed(&one, &json!(0)), fallback_seed(&two, &json!(0)));
    }

    #[test]
    fn batch_is_deterministic_and_unique() {
        let bank = default_bank();
        let ctx = json!({});
        let first = fallback_questions(&bank, 10, &ctx, &json!(0), Mode::Batch, &[]);
        let again = fallback_questions(&bank, 10, &ctx, &json!(0), Mode::Batch, &[]);
        assert_eq!(first, again);
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].id, "q1");
        assert_eq!(first[9].id, "q10");
        let prompts: HashSet<&str> = first.iter().map(|q| q.prompt.as_str()).collect();
        assert_eq!(prompts.len(), 10);
    }

    #[test]
    fn batch_larger_than_bank_returns_whole_bank() {
        let bank = default_bank();
        let all = fallback_questions(&bank, 20, &json!({}), &json!(3), Mode::Batch, &[]);
        assert_eq!(all.len(), bank.len());
    }

    #[test]
    fn single_skips_excluded_prompts() {
        let bank = default_bank();
        let excluded: Vec<String> = bank[..11].iter().map(|q| q.prompt.to_uppercase()).collect();
        let picked = fallback_questions(&bank, 1, &json!({}), &json!(9), Mode::Single, &excluded);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].prompt, bank[11].prompt);
        assert_eq!(picked[0].id, "q1");
    }

    #[test]
    fn single_with_everything_excluded_still_answers() {
        let bank = default_bank();
        let excluded: Vec<String> = bank.iter().map(|q| q.prompt.clone()).collect();
        let picked = fallback_questions(&bank, 1, &json!({}), &json!(9), Mode::Single, &excluded);
        assert_eq!(picked.len(), 1);
    }
}
