//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field has a serde default so an empty source is valid.

pub mod logging;
pub mod realtime;
pub mod server;
pub mod upstream;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::realtime::RealtimeConfig;
use self::server::ServerConfig;
use self::upstream::UpstreamConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// WebSocket listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream persistence API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Presence and routing settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `{dir}/default.toml` with an environment-specific overlay
    /// `{dir}/{env}.toml` and environment variables prefixed with `RELAY__`
    /// (e.g. `RELAY__UPSTREAM__BASE_URL`). All files are optional.
    pub fn load(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("RELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from an in-memory TOML string.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.realtime.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_uses_defaults() {
        let config = AppConfig::from_toml("").expect("empty config");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.upstream.provider, "http");
        assert_eq!(config.upstream.request_timeout_seconds, 10);
        assert_eq!(config.realtime.outbound_buffer_size, 256);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_overlay() {
        let config = AppConfig::from_toml(
            r#"
            [upstream]
            provider = "memory"
            base_url = "http://api.internal:4000"

            [realtime]
            max_connections_per_user = 3
            "#,
        )
        .expect("config");
        assert_eq!(config.upstream.provider, "memory");
        assert_eq!(config.upstream.base_url, "http://api.internal:4000");
        assert_eq!(config.realtime.max_connections_per_user, 3);
        assert_eq!(config.realtime.max_message_length, 4096);
    }

    #[test]
    fn test_zero_outbound_buffer_is_refused() {
        let err = AppConfig::from_toml("[realtime]\noutbound_buffer_size = 0").unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION");
        assert!(err.message.contains("outbound_buffer_size"));

        let config = AppConfig::from_toml("[realtime]\noutbound_buffer_size = 1").expect("config");
        assert_eq!(config.realtime.outbound_buffer_size, 1);
    }

    #[test]
    fn test_load_missing_files_is_default() {
        let config = AppConfig::load("does/not/exist", "test").expect("config");
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
