//! Durable notification creation and deduplication.

pub mod coordinator;

pub use coordinator::NotificationCoordinator;
