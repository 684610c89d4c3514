//! Onboarding A/B questions: client-side acquisition with caching and offline
//! fallback, plus the LLM-backed generation backend it talks to.

pub mod config;
pub mod error;
pub mod generation;
pub mod llm;
pub mod questions;
pub mod store;
