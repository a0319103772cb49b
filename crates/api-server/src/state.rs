//! Application state

use std::sync::Arc;

use dayplan_core::task::{MemoryTaskStore, MongoConfig, MongoTaskStore, TaskRepository};

use crate::config::{ServerConfig, StoreBackend};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    task_store: Arc<dyn TaskRepository>,
}

impl AppState {
    /// Wrap an already constructed task store
    pub fn new(task_store: Arc<dyn TaskRepository>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { task_store }),
        }
    }

    /// Build the configured backend. The MongoDB backend connects here so a
    /// bad endpoint stops startup instead of failing the first request.
    pub async fn from_config(config: &ServerConfig) -> dayplan_core::Result<Self> {
        let task_store: Arc<dyn TaskRepository> = match config.backend {
            StoreBackend::Memory => Arc::new(MemoryTaskStore::new()),
            StoreBackend::Mongo => {
                let store = MongoTaskStore::new(MongoConfig::from_env()?);
                store.connect().await?;
                Arc::new(store)
            }
        };
        tracing::info!("Using {} task store", task_store.backend());
        Ok(Self::new(task_store))
    }

    /// Get reference to the task store
    pub fn task_store(&self) -> &dyn TaskRepository {
        self.inner.task_store.as_ref()
    }
}
