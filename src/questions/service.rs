//! The entry point the onboarding UI calls for question sets.
//!
//! Flow for a full set:
//! 1. Cache (skipped when regenerating)
//! 2. Remote source
//! 3. Offline fallback on any failure except cancellation

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_SET_SIZE;
use crate::error::{Cancelled, QuestionError};

use super::cache::ResultCache;
use super::context::ContextProvider;
use super::model::{QuestionBatch, QuestionOrigin, Regenerated};
use super::sampler::DEGRADED_NOTICE;
use super::source::{BatchRequest, QuestionSource, SingleRequest};

/// Options for loading a full set.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub size: usize,
    /// `0` means "use the cache if possible"; anything else forces a fresh set.
    pub regen_seed: u64,
    pub cancel: CancellationToken,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SET_SIZE,
            regen_seed: 0,
            cancel: CancellationToken::new(),
        }
    }
}

/// Options for replacing one question.
#[derive(Debug, Clone, Default)]
pub struct RegenerateOptions {
    /// Prompts currently shown; the replacement must differ from all of them.
    pub exclude_prompts: Vec<String>,
    /// `0` means "seed from the current time".
    pub regen_seed: u64,
    pub cancel: CancellationToken,
}

/// Orchestrates cache, remote generation and offline fallback.
pub struct QuestionService {
    remote: Arc<dyn QuestionSource>,
    fallback: Arc<dyn QuestionSource>,
    cache: ResultCache,
    context: Arc<dyn ContextProvider>,
    default_size: usize,
}

impl QuestionService {
    pub fn new(
        remote: Arc<dyn QuestionSource>,
        fallback: Arc<dyn QuestionSource>,
        cache: ResultCache,
        context: Arc<dyn ContextProvider>,
    ) -> Self {
        Self {
            remote,
            fallback,
            cache,
            context,
            default_size: DEFAULT_SET_SIZE,
        }
    }

    pub fn with_default_size(mut self, size: usize) -> Self {
        self.default_size = size;
        self
    }

    /// Options for a cache-first load of the configured set size.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            size: self.default_size,
            ..Default::default()
        }
    }

    /// Load a full question set. Only cancellation is reported as an error.
    pub async fn load_set(&self, options: LoadOptions) -> Result<QuestionBatch, Cancelled> {
        let context = self.context.current().await;

        if options.regen_seed == 0 {
            if let Some(questions) = self.cache.get(options.size, &context).await {
                debug!(size = options.size, "Serving onboarding questions from cache");
                return Ok(QuestionBatch {
                    questions,
                    source: QuestionOrigin::Cache,
                    error: None,
                });
            }
        }

        let request = BatchRequest {
            size: options.size,
            context,
            regen_seed: options.regen_seed,
        };

        match self.remote.fetch_batch(&request, &options.cancel).await {
            Ok(batch) => {
                if options.cancel.is_cancelled() {
                    return Err(Cancelled);
                }
                if batch.cacheable {
                    self.cache
                        .put(&batch.questions, request.size, &request.context)
                        .await;
                }
                Ok(QuestionBatch {
                    questions: batch.questions,
                    source: batch.origin,
                    error: batch.notice,
                })
            }
            Err(QuestionError::Cancelled) => {
                debug!("Question load cancelled");
                Err(Cancelled)
            }
            Err(e) => {
                warn!(
                    source = self.remote.name(),
                    error = %e,
                    "Question generation failed, using offline set"
                );
                let questions = match self.fallback.fetch_batch(&request, &options.cancel).await {
                    Ok(batch) => batch.questions,
                    Err(fallback_err) => {
                        warn!(error = %fallback_err, "Offline question source failed");
                        Vec::new()
                    }
                };
                Ok(QuestionBatch {
                    questions,
                    source: QuestionOrigin::Fallback,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    /// Replace one question, keeping clear of the prompts already shown.
    pub async fn regenerate_one(&self, options: RegenerateOptions) -> Result<Regenerated, Cancelled> {
        let regen_seed = match options.regen_seed {
            0 => u64::try_from(Utc::now().timestamp_millis()).unwrap_or(1),
            seed => seed,
        };
        let request = SingleRequest {
            context: self.context.current().await,
            regen_seed,
            exclude_prompts: options.exclude_prompts,
        };

        match self.remote.fetch_one(&request, &options.cancel).await {
            Ok(sourced) => {
                if options.cancel.is_cancelled() {
                    return Err(Cancelled);
                }
                info!(origin = %sourced.origin, "Regenerated onboarding question");
                return Ok(Regenerated::replaced(
                    sourced.question,
                    sourced.origin,
                    sourced.notice,
                ));
            }
            Err(QuestionError::Cancelled) => return Err(Cancelled),
            Err(e) => {
                warn!(
                    source = self.remote.name(),
                    error = %e,
                    "Question regeneration failed, using offline bank"
                );
            }
        }

        match self.fallback.fetch_one(&request, &options.cancel).await {
            Ok(sourced) => Ok(Regenerated::replaced(
                sourced.question,
                QuestionOrigin::Fallback,
                Some(sourced.notice.unwrap_or_else(|| DEGRADED_NOTICE.to_string())),
            )),
            Err(QuestionError::Cancelled) => Err(Cancelled),
            Err(e) => Ok(Regenerated::failed(e.to_string())),
        }
    }
}
