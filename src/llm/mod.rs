//! LLM integration for question generation.
//!
//! `OpenRouterProvider` talks to OpenRouter's OpenAI-compatible chat API and
//! implements the `LlmProvider` trait the generator depends on.

mod openrouter;
pub mod provider;

pub use openrouter::{OPENROUTER_BASE_URL, OpenRouterProvider};
pub use provider::*;

use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::error::LlmError;

/// Create an LLM provider from configuration.
pub fn create_provider(config: &GenerationConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let api_key = config.api_key.clone().ok_or_else(|| LlmError::AuthFailed {
        provider: "openrouter".to_string(),
    })?;

    tracing::info!("Using OpenRouter (model: {})", config.model);
    Ok(Arc::new(OpenRouterProvider::new(
        api_key,
        &config.model,
        &config.app_name,
        &config.site_url,
    )))
}
