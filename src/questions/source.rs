//! The question source capability shared by the remote client and the
//! offline sampler.

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::QuestionError;

use super::model::{Context, Question, QuestionOrigin};

/// Request for a full set.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub size: usize,
    pub context: Context,
    pub regen_seed: u64,
}

/// Request for one replacement question.
#[derive(Debug, Clone)]
pub struct SingleRequest {
    pub context: Context,
    pub regen_seed: u64,
    /// Prompts already shown in the active set.
    pub exclude_prompts: Vec<String>,
}

/// Generation mode sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Batch,
    Single,
}

impl Mode {
    /// Parse the wire label; anything unknown is treated as a batch.
    pub fn from_label(label: &str) -> Self {
        match label {
            "single" => Self::Single,
            _ => Self::Batch,
        }
    }
}

/// A set produced by a source.
#[derive(Debug, Clone)]
pub struct SourcedBatch {
    pub questions: Vec<Question>,
    pub origin: QuestionOrigin,
    /// Whether the set may be written to the result cache.
    pub cacheable: bool,
    /// Non-fatal note for the UI, e.g. a degraded backend.
    pub notice: Option<String>,
}

/// A single question produced by a source.
#[derive(Debug, Clone)]
pub struct SourcedQuestion {
    pub question: Question,
    pub origin: QuestionOrigin,
    pub notice: Option<String>,
}

/// Anything that can supply questions.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Produce a full set of `request.size` questions.
    async fn fetch_batch(
        &self,
        request: &BatchRequest,
        cancel: &CancellationToken,
    ) -> Result<SourcedBatch, QuestionError>;

    /// Produce one question whose prompt is not in `request.exclude_prompts`.
    async fn fetch_one(
        &self,
        request: &SingleRequest,
        cancel: &CancellationToken,
    ) -> Result<SourcedQuestion, QuestionError>;
}
