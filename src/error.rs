//! Error types for the onboarding question service.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Question error: {0}")]
    Question(#[from] QuestionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Env file error: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Settings store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Insufficient valid questions: wanted {wanted}, got {got}")]
    InsufficientQuestions { wanted: usize, got: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while acquiring questions.
///
/// Only `Cancelled` ever leaves `QuestionService`; everything else is folded
/// into a fallback result carrying `to_string()` as its `error`.
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("AI service unavailable ({status})")]
    Unavailable { status: u16 },

    #[error("Unable to load AI questions: {0}")]
    Transport(String),

    #[error("AI returned invalid question format: {0}")]
    MalformedResponse(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Cached questions unreadable: {0}")]
    CacheCorrupt(String),

    #[error("Unable to regenerate question")]
    ExhaustedFallback,
}

impl QuestionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// An in-flight request was cancelled by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Request cancelled")]
pub struct Cancelled;

impl From<Cancelled> for QuestionError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
