//! Presence status and friend fan-out.

pub mod broadcaster;
pub mod status;

pub use broadcaster::PresenceBroadcaster;
pub use status::PresenceStatus;
