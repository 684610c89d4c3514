//! LLM-backed question generation with retries.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::questions::model::Question;
use crate::questions::source::Mode;
use crate::questions::topics::TopicFilter;
use crate::questions::validator::{ResponseValidator, strip_json_fence};

use super::prompts::{SYSTEM_PROMPT, batch_prompt, single_prompt};

const BATCH_TEMPERATURE: f32 = 0.8;
const SINGLE_TEMPERATURE: f32 = 0.6;
const BATCH_MAX_TOKENS: u32 = 900;
const SINGLE_MAX_TOKENS: u32 = 260;

/// Attempt budget and sampling settings for one mode.
#[derive(Debug, Clone, Copy)]
struct ModeSettings {
    attempts: u32,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

/// Generates validated, topic-filtered A/B questions.
pub struct QuestionGenerator {
    llm: Arc<dyn LlmProvider>,
    config: GenerationConfig,
    validator: ResponseValidator,
}

impl QuestionGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: GenerationConfig) -> Self {
        Self {
            llm,
            config,
            validator: ResponseValidator::new().with_topic_filter(TopicFilter::default()),
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    fn settings(&self, mode: Mode) -> ModeSettings {
        match mode {
            Mode::Batch => ModeSettings {
                attempts: self.config.batch_attempts,
                timeout: self.config.batch_timeout,
                temperature: BATCH_TEMPERATURE,
                max_tokens: BATCH_MAX_TOKENS,
            },
            Mode::Single => ModeSettings {
                attempts: self.config.single_attempts,
                timeout: self.config.single_timeout,
                temperature: SINGLE_TEMPERATURE,
                max_tokens: SINGLE_MAX_TOKENS,
            },
        }
    }

    /// Generate `count` questions, retrying until one attempt yields enough.
    pub async fn generate(
        &self,
        count: usize,
        context: &Value,
        mode: Mode,
        exclude_prompts: &[String],
    ) -> Result<Vec<Question>, LlmError> {
        let settings = self.settings(mode);
        let user_prompt = match mode {
            Mode::Batch => batch_prompt(count, context),
            Mode::Single => single_prompt(exclude_prompts, context),
        };

        let mut last_error = None;
        for attempt in 1..=settings.attempts.max(1) {
            let request = CompletionRequest::new(vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(user_prompt.clone()),
            ])
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
            .with_json_mode()
            .with_timeout(settings.timeout);

            match self.attempt(request, count).await {
                Ok(questions) => {
                    info!(
                        attempt,
                        count = questions.len(),
                        model = self.llm.model_name(),
                        "Generated onboarding questions"
                    );
                    return Ok(questions);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Question generation attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::InsufficientQuestions {
            wanted: count,
            got: 0,
        }))
    }

    async fn attempt(
        &self,
        request: CompletionRequest,
        count: usize,
    ) -> Result<Vec<Question>, LlmError> {
        let response = self.llm.complete(request).await?;
        let json_text = strip_json_fence(&response.content);
        let payload: Value = serde_json::from_str(json_text)?;

        let questions = self.validator.validate(&payload, count);
        if questions.len() < count {
            debug!(raw = %json_text, "Model output short after filtering");
            return Err(LlmError::InsufficientQuestions {
                wanted: count,
                got: questions.len(),
            });
        }
        Ok(questions)
    }
}
