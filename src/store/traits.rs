//! Async JSON key/value persistence per user.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Well-known settings keys.
pub mod settings_keys {
    /// Single-slot cache of the last AI-generated question set.
    pub const QUESTIONS_CACHE: &str = "onboarding_questions_cache";
    /// Externally-owned onboarding progress (the question context source).
    pub const ONBOARDING_STATE: &str = "onboarding_state";
    /// Default user ID (single-user device).
    pub const DEFAULT_USER: &str = "default";
}

/// Backend-agnostic settings persistence.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a setting. Values that fail to parse are reported as
    /// `DatabaseError::Serialization`.
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or overwrite a setting.
    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Delete a setting. Returns whether it existed.
    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError>;
}
