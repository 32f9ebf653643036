//! Application state for the HTTP server

use std::sync::Arc;

use crate::auth::UserDirectory;
use crate::config::RagConfig;
use crate::engine::QueryEngine;
use crate::error::Result;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Query engine, owns every index
    engine: Arc<QueryEngine>,
    /// Static user directory
    users: UserDirectory,
}

impl AppState {
    /// Create state with the engine described by the configuration
    pub fn new(config: RagConfig) -> Result<Self> {
        let engine = Arc::new(QueryEngine::from_config(&config)?);
        Ok(Self::with_engine(config, engine))
    }

    /// Create state around an existing engine
    pub fn with_engine(config: RagConfig, engine: Arc<QueryEngine>) -> Self {
        let users = UserDirectory::new(config.users.clone());
        if users.is_empty() {
            tracing::warn!("No users configured; every authenticated route will reject requests");
        } else {
            tracing::info!("Loaded {} users", users.len());
        }

        Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                users,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the query engine
    pub fn engine(&self) -> &Arc<QueryEngine> {
        &self.inner.engine
    }

    /// Get the user directory
    pub fn users(&self) -> &UserDirectory {
        &self.inner.users
    }

    /// Whether the engine serves queries
    pub fn is_ready(&self) -> bool {
        self.inner.engine.is_ready()
    }
}
