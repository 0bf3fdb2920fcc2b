//! # relay-upstream
//!
//! Implementations of [`relay_core::traits::RelayBackend`]:
//!
//! - [`HttpBackend`] talks to the real messages/notifications API
//! - [`MemoryBackend`] keeps everything in process memory, for local
//!   development and tests

pub mod providers;

use std::sync::Arc;

use relay_core::config::upstream::UpstreamConfig;
use relay_core::error::AppError;
use relay_core::result::AppResult;
use relay_core::traits::RelayBackend;

pub use providers::http::HttpBackend;
pub use providers::memory::{BackendCall, MemoryBackend};

/// Build the configured backend provider.
pub fn build_backend(config: &UpstreamConfig) -> AppResult<Arc<dyn RelayBackend>> {
    match config.provider.as_str() {
        "http" => Ok(Arc::new(HttpBackend::new(config)?)),
        "memory" => {
            tracing::warn!("Using in-memory upstream backend; nothing will be persisted");
            Ok(Arc::new(MemoryBackend::new()))
        }
        other => Err(AppError::configuration(format!(
            "Unknown upstream provider '{other}' (expected 'http' or 'memory')"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_known_providers() {
        let mut config = UpstreamConfig::default();
        assert_eq!(build_backend(&config).unwrap().provider_name(), "http");
        config.provider = "memory".to_string();
        assert_eq!(build_backend(&config).unwrap().provider_name(), "memory");
    }

    #[test]
    fn test_build_unknown_provider_fails() {
        let config = UpstreamConfig {
            provider: "carrier-pigeon".to_string(),
            ..UpstreamConfig::default()
        };
        let err = build_backend(&config).unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION");
    }
}
