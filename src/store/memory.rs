//! In-memory settings store for tests and ephemeral hosts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::DatabaseError;

use super::traits::SettingsStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: RwLock<HashMap<(String, String), serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError> {
        let settings = self.settings.read().await;
        Ok(settings
            .get(&(user_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let mut settings = self.settings.write().await;
        settings.insert((user_id.to_string(), key.to_string()), value.clone());
        Ok(())
    }

    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError> {
        let mut settings = self.settings.write().await;
        Ok(settings
            .remove(&(user_id.to_string(), key.to_string()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemoryStore::new();
        assert!(store.get_setting("default", "k").await.unwrap().is_none());

        store.set_setting("default", "k", &json!({"v": 1})).await.unwrap();
        store.set_setting("other", "k", &json!({"v": 2})).await.unwrap();
        assert_eq!(
            store.get_setting("default", "k").await.unwrap(),
            Some(json!({"v": 1}))
        );

        store.set_setting("default", "k", &json!({"v": 3})).await.unwrap();
        assert_eq!(
            store.get_setting("default", "k").await.unwrap(),
            Some(json!({"v": 3}))
        );

        assert!(store.delete_setting("default", "k").await.unwrap());
        assert!(!store.delete_setting("default", "k").await.unwrap());
        assert!(store.get_setting("other", "k").await.unwrap().is_some());
    }
}
