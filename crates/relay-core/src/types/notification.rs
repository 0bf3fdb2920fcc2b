//! Durable notification model.

use serde::{Deserialize, Serialize};

use super::id::{NotificationId, UserId};
use super::profile::{SenderSnapshot, UserRef};

/// Notification type codes understood by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum NotificationType {
    /// A friend request was sent.
    FriendRequest,
    /// A chat message arrived while the receiver was unreachable.
    Message,
    /// A friend published a post.
    Post,
    /// Any other code, passed through untouched.
    Other(u8),
}

impl From<u8> for NotificationType {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::FriendRequest,
            2 => Self::Message,
            3 => Self::Post,
            other => Self::Other(other),
        }
    }
}

impl From<NotificationType> for u8 {
    fn from(kind: NotificationType) -> Self {
        match kind {
            NotificationType::FriendRequest => 1,
            NotificationType::Message => 2,
            NotificationType::Post => 3,
            NotificationType::Other(code) => code,
        }
    }
}

/// A notification as returned by the upstream API and delivered live.
///
/// Fields the relay does not interpret are preserved in `extra` and
/// forwarded to clients unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Server-assigned ID.
    #[serde(rename = "_id", alias = "id")]
    pub id: NotificationId,
    /// Recipient.
    pub receiver: UserId,
    /// Originator; a bare ID until the relay attaches a snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserRef>,
    /// Type code.
    pub notification_type: NotificationType,
    /// Uninterpreted fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NotificationRecord {
    /// Replace the sender reference with a full profile snapshot.
    pub fn attach_sender(mut self, snapshot: SenderSnapshot) -> Self {
        self.sender = Some(UserRef::Profile(snapshot));
        self
    }

    /// The sender's user ID, if known.
    pub fn sender_id(&self) -> Option<&UserId> {
        self.sender.as_ref().map(UserRef::id)
    }
}
