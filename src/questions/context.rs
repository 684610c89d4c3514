//! Where the current onboarding context comes from.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{SettingsStore, settings_keys};

use super::model::Context;

/// Supplies the user's in-progress onboarding context.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// The current context. Never fails; unknown state is the empty context.
    async fn current(&self) -> Context;
}

/// Reads the onboarding state persisted by the onboarding flow.
pub struct StoredContext {
    store: Arc<dyn SettingsStore>,
}

impl StoredContext {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ContextProvider for StoredContext {
    async fn current(&self) -> Context {
        match self
            .store
            .get_setting(settings_keys::DEFAULT_USER, settings_keys::ONBOARDING_STATE)
            .await
        {
            Ok(Some(state)) => Context::from_state(&state),
            Ok(None) => Context::default(),
            Err(e) => {
                debug!(error = %e, "Onboarding state unreadable, using empty context");
                Context::default()
            }
        }
    }
}

/// A context held in memory and updated by the host.
#[derive(Default)]
pub struct FixedContext {
    context: RwLock<Context>,
}

impl FixedContext {
    pub fn new(context: Context) -> Self {
        Self {
            context: RwLock::new(context),
        }
    }

    pub async fn set(&self, context: Context) {
        *self.context.write().await = context;
    }
}

#[async_trait]
impl ContextProvider for FixedContext {
    async fn current(&self) -> Context {
        self.context.read().await.clone()
    }
}
