//! Application state shared across handlers.

use std::sync::Arc;

use relay_core::config::AppConfig;
use relay_realtime::RelayEngine;

/// Application state passed to every handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Relay engine (registry, router, metrics)
    pub engine: RelayEngine,
}

impl AppState {
    /// Creates state around an existing engine.
    pub fn new(config: AppConfig, engine: RelayEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
