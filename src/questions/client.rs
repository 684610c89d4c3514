//! HTTP client for the question generation backend.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::QuestionsConfig;
use crate::error::QuestionError;

use super::model::{Context, QuestionOrigin};
use super::sampler::DEGRADED_NOTICE;
use super::source::{
    BatchRequest, Mode, QuestionSource, SingleRequest, SourcedBatch, SourcedQuestion,
};
use super::validator::ResponseValidator;

/// Request body sent to `/api/onboarding/questions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboundRequest<'a> {
    count: usize,
    context: &'a Context,
    regen_seed: u64,
    mode: Mode,
    exclude_prompts: &'a [String],
}

/// How a backend `source` label is treated: origin, cacheable, notice.
fn interpret_source(label: Option<&str>) -> (QuestionOrigin, bool, Option<String>) {
    match label {
        Some("fallback") => (
            QuestionOrigin::Fallback,
            false,
            Some(DEGRADED_NOTICE.to_string()),
        ),
        None | Some("ai") | Some("openrouter") => (QuestionOrigin::Ai, true, None),
        Some(_) => (QuestionOrigin::Ai, false, None),
    }
}

/// Cancellable client for batch and single-question generation.
pub struct RemoteQuestionClient {
    http: reqwest::Client,
    endpoint: String,
    validator: ResponseValidator,
}

impl RemoteQuestionClient {
    /// Build a client whose requests are bounded by `config.request_timeout`.
    ///
    /// A native host has no same origin, so an empty base URL is rejected.
    pub fn new(config: &QuestionsConfig) -> Result<Self, QuestionError> {
        if config.api_base_url.is_empty() {
            warn!("ONBOARDING_API_BASE_URL is not set, cannot reach the question backend");
            return Err(QuestionError::Transport(
                "ONBOARDING_API_BASE_URL is not set".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| QuestionError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, config.questions_endpoint()))
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            validator: ResponseValidator::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(
        &self,
        body: &OutboundRequest<'_>,
        expected: usize,
        cancel: &CancellationToken,
    ) -> Result<SourcedBatch, QuestionError> {
        if cancel.is_cancelled() {
            return Err(QuestionError::Cancelled);
        }

        debug!(
            endpoint = %self.endpoint,
            mode = ?body.mode,
            count = body.count,
            "Requesting onboarding questions"
        );

        let send = self.http.post(&self.endpoint).json(body).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(QuestionError::Cancelled),
            result = send => result.map_err(|e| QuestionError::Transport(e.to_string()))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(QuestionError::Unavailable {
                status: status.as_u16(),
            });
        }

        let payload: Value = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(QuestionError::Cancelled),
            result = response.json::<Value>() => result.map_err(|e| {
                if e.is_decode() {
                    QuestionError::MalformedResponse(e.to_string())
                } else {
                    QuestionError::Transport(e.to_string())
                }
            })?,
        };

        let questions = self.validator.validate(&payload, expected);
        if questions.len() < expected {
            return Err(QuestionError::MalformedResponse(format!(
                "expected {expected} valid questions, got {}",
                questions.len()
            )));
        }

        let (origin, cacheable, notice) =
            interpret_source(payload.get("source").and_then(Value::as_str));
        info!(count = questions.len(), origin = %origin, "Received onboarding questions");

        Ok(SourcedBatch {
            questions,
            origin,
            cacheable,
            notice,
        })
    }
}

#[async_trait]
impl QuestionSource for RemoteQuestionClient {
    fn name(&self) -> &str {
        "remote"
    }

    async fn fetch_batch(
        &self,
        request: &BatchRequest,
        cancel: &CancellationToken,
    ) -> Result<SourcedBatch, QuestionError> {
        let body = OutboundRequest {
            count: request.size,
            context: &request.context,
            regen_seed: request.regen_seed,
            mode: Mode::Batch,
            exclude_prompts: &[],
        };
        self.request(&body, request.size, cancel).await
    }

    async fn fetch_one(
        &self,
        request: &SingleRequest,
        cancel: &CancellationToken,
    ) -> Result<SourcedQuestion, QuestionError> {
        let body = OutboundRequest {
            count: 1,
            context: &request.context,
            regen_seed: request.regen_seed,
            mode: Mode::Single,
            exclude_prompts: &request.exclude_prompts,
        };
        let batch = self.request(&body, 1, cancel).await?;
        let question = batch.questions.into_iter().next().ok_or_else(|| {
            QuestionError::MalformedResponse("empty single-question response".into())
        })?;
        Ok(SourcedQuestion {
            question,
            origin: batch.origin,
            notice: batch.notice,
        })
    }
}
