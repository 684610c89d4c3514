//! Backend that generates onboarding questions with an LLM and serves them
//! over HTTP, falling back to a seeded shuffle of the bank.

pub mod fallback;
pub mod generator;
pub mod prompts;
pub mod routes;

pub use fallback::{clamp_count, fallback_questions};
pub use generator::QuestionGenerator;
pub use routes::{GenerationState, generation_routes};
