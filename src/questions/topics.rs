//! Topics generated questions must stay away from.

use regex::RegexSet;

/// Word-boundary patterns, matched against lowercased question text.
pub const DISALLOWED_TOPIC_PATTERNS: &[&str] = &[
    r"\bpay(?:ment|ing)?\b",
    r"\bfares?\b",
    r"\bpric(?:e|es|ed|ing)\b",
    r"\bcost(?:s|ly)?\b",
    r"\bdiscount(?:s|ed)?\b",
    r"\bsubscriptions?\b",
    r"\bpromo(?:tion|code|codes)?\b",
    r"\bwallet\b",
    r"\bcredit\s*card\b",
    r"\bdebit\s*card\b",
    r"\bcash\b",
    r"\bvenmo\b",
    r"\bpaypal\b",
    r"\bapple\s*pay\b",
    r"\bgoogle\s*pay\b",
    r"\bapp\b",
    r"\bfeatures?\b",
    r"\bui\b",
    r"\binterface\b",
    r"\bsettings?\b",
    r"\bnotifications?\b",
    r"\bbuttons?\b",
    r"\bin[-\s]?app\b",
    r"\bmessag(?:e|es|ing)\b",
    r"\bchat(?:ting)?\b",
    r"\bphone\s*calls?\b",
    r"\bcall\s+drivers?\b",
    r"\bcontact\s+methods?\b",
    r"\bhow\s+to\s+contact\b",
];

/// Compiled disallowed-topic matcher.
#[derive(Debug, Clone)]
pub struct TopicFilter {
    set: RegexSet,
    patterns: Vec<String>,
}

impl TopicFilter {
    pub fn new(patterns: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            set: RegexSet::new(patterns)?,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        })
    }

    /// The first pattern hit by the combined question text, if any.
    pub fn first_match(&self, prompt: &str, a: &str, b: &str) -> Option<&str> {
        let full = format!("{prompt} {a} {b}").to_lowercase();
        self.set
            .matches(&full)
            .iter()
            .next()
            .map(|i| self.patterns[i].as_str())
    }

    pub fn is_disallowed(&self, prompt: &str, a: &str, b: &str) -> bool {
        self.first_match(prompt, a, b).is_some()
    }
}

impl Default for TopicFilter {
    fn default() -> Self {
        // The built-in patterns are fixed and known to compile.
        Self::new(DISALLOWED_TOPIC_PATTERNS).expect("built-in topic patterns are valid")
    }
}
