//! Onboarding A/B questions: acquisition, caching and offline fallback.

pub mod bank;
pub mod cache;
pub mod client;
pub mod context;
pub mod model;
pub mod sampler;
pub mod service;
pub mod source;
pub mod topics;
pub mod validator;

pub use cache::ResultCache;
pub use client::RemoteQuestionClient;
pub use context::{ContextProvider, FixedContext, StoredContext};
pub use model::{Context, Question, QuestionBatch, QuestionOrigin, Regenerated};
pub use sampler::FallbackSampler;
pub use service::{LoadOptions, QuestionService, RegenerateOptions};
pub use source::QuestionSource;
pub use validator::ResponseValidator;
