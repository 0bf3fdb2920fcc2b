//! WebSocket listener configuration.

use serde::{Deserialize, Serialize};

/// Listener configuration for the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds a new socket has to present its handshake before it is closed.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            handshake_timeout_seconds: default_handshake_timeout(),
        }
    }
}

impl ServerConfig {
    /// `host:port` bind string.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_handshake_timeout() -> u64 {
    10
}
