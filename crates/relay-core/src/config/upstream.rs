//! Upstream persistence API configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external messages/notifications API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Backend provider: `"http"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Root URL of the API (without the `/api` suffix).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds; an expired call is a failure.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_provider() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
