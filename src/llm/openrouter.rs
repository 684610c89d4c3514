//! OpenRouter chat completions over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::LlmError;

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

const PROVIDER: &str = "openrouter";
/// Used when a request carries no timeout of its own.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChatCompletion {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenRouter-backed provider. Identifies the app via `HTTP-Referer` and `X-Title`.
pub struct OpenRouterProvider {
    client: Client,
    api_key: SecretString,
    model: String,
    app_name: String,
    site_url: String,
    base_url: String,
}

impl OpenRouterProvider {
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        app_name: impl Into<String>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            app_name: app_name.into(),
            site_url: site_url.into(),
            base_url: OPENROUTER_BASE_URL.to_string(),
        }
    }

    /// Point the provider at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionBody<'a> {
        ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_mode
                .then(|| json!({ "type": "json_object" })),
        }
    }

    fn request_error(&self, e: reqwest::Error, timeout: Duration) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: PROVIDER.to_string(),
                timeout,
            }
        } else {
            LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let timeout = request.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, messages = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.app_name)
            .timeout(timeout)
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|e| self.request_error(e, timeout))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), detail = %detail, "OpenRouter HTTP error");
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let choice = completion.choices.into_iter().next();
        let finish_reason =
            FinishReason::from_label(choice.as_ref().and_then(|c| c.finish_reason.as_deref()));
        let content = choice
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();
        let (input_tokens, output_tokens) = completion
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
            finish_reason,
            response_id: completion.id,
        })
    }
}
