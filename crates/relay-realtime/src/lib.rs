//! # relay-realtime
//!
//! Presence and delivery engine for the social relay. Provides:
//!
//! - The presence registry of live connections per user
//! - Three-tier chat message routing (same conversation, messaging
//!   surface, durable notification)
//! - Notification deduplication against the upstream API
//! - Online/offline fan-out to friends
//! - Typing indicators, friend requests and post notifications

pub mod connection;
pub mod engine;
pub mod fanout;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod presence;
pub mod router;

pub use connection::registry::{PresenceRegistry, SharedRegistry};
pub use engine::RelayEngine;
pub use fanout::FanOutReport;
pub use message::types::{InboundEvent, OutboundEvent};
pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use notification::coordinator::NotificationCoordinator;
pub use presence::broadcaster::PresenceBroadcaster;
pub use presence::status::PresenceStatus;
pub use router::EventRouter;
