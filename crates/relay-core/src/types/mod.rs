//! Core type definitions used across the relay workspace.

pub mod id;
pub mod message;
pub mod notification;
pub mod profile;

pub use id::*;
pub use message::Message;
pub use notification::{NotificationRecord, NotificationType};
pub use profile::{Credential, SenderSnapshot, UserRef};
