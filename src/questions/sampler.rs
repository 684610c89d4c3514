//! Deterministic offline sampler over the question bank.
//!
//! Each bank entry gets a score from a 64-bit mix of its index and the seed;
//! entries are ordered by score. No external entropy is involved, so the same
//! `(bank, size, seed)` always yields the same set.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::QuestionError;

use super::bank::default_bank;
use super::model::{Question, QuestionOrigin, positional_id, prompt_key, renumber};
use super::source::{BatchRequest, QuestionSource, SingleRequest, SourcedBatch, SourcedQuestion};

/// Notice attached to fallback questions served in place of generated ones.
pub const DEGRADED_NOTICE: &str = "AI generation unavailable";

/// splitmix64 finalizer.
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Pseudo-random score of bank entry `index` under `seed`.
pub fn score(index: usize, seed: u64) -> u64 {
    mix64(mix64(seed) ^ (index as u64).wrapping_add(1))
}

/// Full deterministic ordering of the bank for `seed`.
fn ordering(bank: &[Question], seed: u64) -> Vec<&Question> {
    let mut scored: Vec<(u64, usize)> = (0..bank.len()).map(|i| (score(i, seed), i)).collect();
    scored.sort_unstable();
    scored.into_iter().map(|(_, i)| &bank[i]).collect()
}

/// Take the first `size` entries of the seeded ordering, renumbered.
///
/// A `size` larger than the bank returns the whole bank, without repeats.
pub fn sample(bank: &[Question], size: usize, seed: u64) -> Vec<Question> {
    let picked = ordering(bank, seed).into_iter().take(size).cloned().collect();
    renumber(picked)
}

/// First entry of the seeded ordering whose prompt is not excluded.
///
/// Falls back to the top entry when everything is excluded; `None` only for
/// an empty bank.
pub fn sample_excluding(bank: &[Question], seed: u64, exclude_prompts: &[String]) -> Option<Question> {
    let excluded: HashSet<String> = exclude_prompts.iter().map(|p| prompt_key(p)).collect();
    let order = ordering(bank, seed);
    let chosen = order
        .iter()
        .find(|q| !excluded.contains(&q.prompt_key()))
        .or_else(|| order.first())?;

    Some(Question {
        id: positional_id(0),
        ..(*chosen).clone()
    })
}

/// Offline question source backed by a fixed bank.
#[derive(Debug, Clone)]
pub struct FallbackSampler {
    bank: Arc<[Question]>,
}

impl FallbackSampler {
    pub fn new(bank: Vec<Question>) -> Self {
        Self { bank: bank.into() }
    }

    pub fn bank(&self) -> &[Question] {
        &self.bank
    }

    pub fn sample(&self, size: usize, seed: u64) -> Vec<Question> {
        sample(&self.bank, size, seed)
    }

    pub fn sample_excluding(&self, seed: u64, exclude_prompts: &[String]) -> Option<Question> {
        sample_excluding(&self.bank, seed, exclude_prompts)
    }
}

impl Default for FallbackSampler {
    fn default() -> Self {
        Self::new(default_bank())
    }
}

#[async_trait]
impl QuestionSource for FallbackSampler {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn fetch_batch(
        &self,
        request: &BatchRequest,
        _cancel: &CancellationToken,
    ) -> Result<SourcedBatch, QuestionError> {
        Ok(SourcedBatch {
            questions: self.sample(request.size, request.regen_seed),
            origin: QuestionOrigin::Fallback,
            cacheable: false,
            notice: None,
        })
    }

    async fn fetch_one(
        &self,
        request: &SingleRequest,
        _cancel: &CancellationToken,
    ) -> Result<SourcedQuestion, QuestionError> {
        let question = self
            .sample_excluding(request.regen_seed, &request.exclude_prompts)
            .ok_or(QuestionError::ExhaustedFallback)?;
        Ok(SourcedQuestion {
            question,
            origin: QuestionOrigin::Fallback,
            notice: Some(DEGRADED_NOTICE.to_string()),
        })
    }
}
