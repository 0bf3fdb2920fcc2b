//! Chat message model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::id::{ConversationId, MessageId, UserId};
use super::profile::deserialize_user_ref;

/// A chat message as routed by the relay and persisted upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned ID; absent until persisted.
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<MessageId>,
    /// Conversation the message belongs to.
    pub conversation_id: ConversationId,
    /// Author of the message.
    #[serde(deserialize_with = "deserialize_user_ref")]
    pub sender: UserId,
    /// Text body.
    pub content: String,
    /// Users who have viewed the message. Set semantics.
    #[serde(default)]
    pub seen_by: BTreeSet<UserId>,
}

impl Message {
    /// Create an unpersisted message.
    pub fn new(
        conversation_id: ConversationId,
        sender: UserId,
        content: impl Into<String>,
        seen_by: BTreeSet<UserId>,
    ) -> Self {
        Self {
            id: None,
            conversation_id,
            sender,
            content: content.into(),
            seen_by,
        }
    }

    /// Record that `user` has viewed this message.
    ///
    /// Returns `false` if the user was already present.
    pub fn mark_seen_by(&mut self, user: UserId) -> bool {
        self.seen_by.insert(user)
    }

    /// Whether `user` has viewed this message.
    pub fn is_seen_by(&self, user: &UserId) -> bool {
        self.seen_by.contains(user)
    }
}
