//! Prompt templates for A/B question generation.

use serde_json::Value;

/// At most this many excluded prompts are listed in a single-question request.
pub const MAX_EXCLUDED_IN_PROMPT: usize = 8;

pub const SYSTEM_PROMPT: &str = "\
Goal: Generate A/B questions to elicit user values for matching users for carpooling. \
Focus on higher-level value dimensions such as punctuality, efficiency, trustworthiness, kindness, \
safety, communication, flexibility, comfort, environmental impact, reliability, and fairness. \
Questions must reveal meaningful tradeoffs between values, not surface-level wording changes. \
Do not ask about processes like payment methods, fares, pricing, or discounts. \
Vocabulary should be simple and accessible, avoiding jargon or abstract concepts. \
Return strict JSON only with this exact shape: \
{\"questions\":[{\"prompt\":\"...\",\"a\":\"...\",\"b\":\"...\"}]}. \
No markdown. No commentary. No extra keys.";

/// Context JSON with every non-ASCII character escaped.
pub fn context_json(context: &Value) -> String {
    let raw = serde_json::to_string(context).unwrap_or_else(|_| "{}".to_string());
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

pub fn batch_prompt(count: usize, context: &Value) -> String {
    format!(
        "Generate {count} unique A/B questions tailored to carpooling. \
         Each question should map to one primary value tradeoff (e.g., punctuality vs flexibility, \
         efficiency vs comfort, consistency vs flexibility, sustainability vs speed). \
         Do not ask about app features, payment methods, fares, or pricing. \
         Each prompt should be concise and scenario-based. \
         Each option should be clear, balanced, and <= 160 chars. \
         Avoid repeating the same value pairing across multiple questions. \
         User context: {}",
        context_json(context)
    )
}

pub fn single_prompt(exclude_prompts: &[String], context: &Value) -> String {
    let banned = exclude_prompts
        .iter()
        .take(MAX_EXCLUDED_IN_PROMPT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Generate 1 unique A/B question tailored to carpooling values. \
         Target one meaningful value tradeoff (e.g., punctuality vs flexibility, efficiency vs comfort). \
         Do not mention app features, payment, fares, or pricing. \
         Keep it concise and scenario-based. Options must be <= 140 chars. \
         Avoid these prompts: {banned}. \
         User context: {}",
        context_json(context)
    )
}
