//! Presence and routing configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Presence registry and event router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound event buffer.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Maximum live connections per user; `0` means unlimited.
    /// When the limit is reached the oldest connection is retired.
    #[serde(default)]
    pub max_connections_per_user: usize,
    /// Maximum chat message length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Maximum raw inbound frame size in bytes.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
    /// Inbound events one connection may have in flight at once. Further
    /// frames are not read until one completes.
    #[serde(default = "default_max_inflight_events")]
    pub max_inflight_events: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            max_connections_per_user: 0,
            max_message_length: default_max_message_length(),
            max_frame_size: default_max_frame_size(),
            max_inflight_events: default_max_inflight_events(),
        }
    }
}

impl RealtimeConfig {
    /// Rejects values the relay cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.outbound_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.outbound_buffer_size must be at least 1",
            ));
        }
        if self.max_frame_size == 0 {
            return Err(AppError::configuration(
                "realtime.max_frame_size must be at least 1",
            ));
        }
        if self.max_inflight_events == 0 {
            return Err(AppError::configuration(
                "realtime.max_inflight_events must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_message_length() -> usize {
    4096
}

fn default_max_frame_size() -> usize {
    65_536
}

fn default_max_inflight_events() -> usize {
    8
}
