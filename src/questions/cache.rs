//! Single-slot, TTL-bound cache of the last AI-generated question set.
//!
//! The slot is keyed by requested size and context fingerprint. Anything that
//! cannot be read back counts as a miss.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DEFAULT_CACHE_TTL;
use crate::error::QuestionError;
use crate::store::{SettingsStore, settings_keys};

use super::model::{Context, Question};
use super::validator::ResponseValidator;

/// Persisted shape of the cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Write time, epoch milliseconds.
    pub ts: i64,
    pub size: usize,
    pub context_hash: String,
    pub questions: Vec<Question>,
}

pub struct ResultCache {
    store: Arc<dyn SettingsStore>,
    ttl: Duration,
    validator: ResponseValidator,
}

impl ResultCache {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_ttl(store, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(store: Arc<dyn SettingsStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            validator: ResponseValidator::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached set for `(size, context)`, if fresh.
    pub async fn get(&self, size: usize, context: &Context) -> Option<Vec<Question>> {
        self.get_at(size, context, Utc::now()).await
    }

    pub async fn get_at(
        &self,
        size: usize,
        context: &Context,
        now: DateTime<Utc>,
    ) -> Option<Vec<Question>> {
        let record = match self.read_record().await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "Treating unreadable question cache as a miss");
                return None;
            }
        };

        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if record.ts <= 0 || now.timestamp_millis().saturating_sub(record.ts) > ttl_ms {
            debug!(ts = record.ts, "Question cache expired");
            return None;
        }
        if record.size != size {
            return None;
        }
        if record.context_hash != context.fingerprint() {
            debug!("Question cache context changed");
            return None;
        }

        let items: Vec<serde_json::Value> = record
            .questions
            .iter()
            .filter_map(|q| serde_json::to_value(q).ok())
            .collect();
        let questions = self.validator.validate_items(&items, size);
        if questions.len() < size {
            debug!(found = questions.len(), size, "Cached question set is incomplete");
            return None;
        }
        Some(questions)
    }

    /// Overwrite the slot with a freshly generated set.
    pub async fn put(&self, questions: &[Question], size: usize, context: &Context) {
        self.put_at(questions, size, context, Utc::now()).await
    }

    pub async fn put_at(
        &self,
        questions: &[Question],
        size: usize,
        context: &Context,
        now: DateTime<Utc>,
    ) {
        let record = CacheRecord {
            ts: now.timestamp_millis(),
            size,
            context_hash: context.fingerprint(),
            questions: questions.to_vec(),
        };
        let value = match serde_json::to_value(&record) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Failed to serialize question cache");
                return;
            }
        };
        if let Err(e) = self
            .store
            .set_setting(
                settings_keys::DEFAULT_USER,
                settings_keys::QUESTIONS_CACHE,
                &value,
            )
            .await
        {
            warn!(error = %e, "Failed to persist question cache");
        }
    }

    async fn read_record(&self) -> Result<Option<CacheRecord>, QuestionError> {
        let value = self
            .store
            .get_setting(settings_keys::DEFAULT_USER, settings_keys::QUESTIONS_CACHE)
            .await
            .map_err(|e| QuestionError::CacheCorrupt(e.to_string()))?;
        value
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| QuestionError::CacheCorrupt(e.to_string()))
    }
}
