//! Inbound and outbound event type definitions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use relay_core::types::{
    ConversationId, Message, NotificationId, NotificationRecord, UserId, UserRef,
};

use super::validator::non_empty_key;
use crate::presence::status::PresenceStatus;

/// Events sent by a client to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Send a chat message to another user.
    SendMessage(SendMessagePayload),
    /// The acting user published a post; notify their friends.
    PublishPost,
    /// Forward a freshly created friend-request notification.
    SendFriendRequest(FriendRequestPayload),
    /// The acting user accepted a friend request.
    AcceptFriendRequest(AcceptFriendRequestPayload),
    /// Ask whether one user is online.
    QueryUserStatus(QueryUserStatusPayload),
    /// Ask which of a list of users (default: own friends) are online.
    QueryFriendsStatus(QueryFriendsStatusPayload),
    /// The acting user started typing in a conversation.
    StartTyping(TypingPayload),
    /// The acting user stopped typing in a conversation.
    StopTyping(TypingPayload),
    /// The connection opened the messaging UI.
    EnterMessagingSurface,
    /// The connection left the messaging UI.
    LeaveMessagingSurface,
    /// The connection opened (or, with no id, closed) a conversation.
    EnterConversation(EnterConversationPayload),
    /// The client is about to close the connection.
    Disconnect,
}

impl InboundEvent {
    /// Wire name of the event, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => "sendMessage",
            Self::PublishPost => "publishPost",
            Self::SendFriendRequest(_) => "sendFriendRequest",
            Self::AcceptFriendRequest(_) => "acceptFriendRequest",
            Self::QueryUserStatus(_) => "queryUserStatus",
            Self::QueryFriendsStatus(_) => "queryFriendsStatus",
            Self::StartTyping(_) => "startTyping",
            Self::StopTyping(_) => "stopTyping",
            Self::EnterMessagingSurface => "enterMessagingSurface",
            Self::LeaveMessagingSurface => "leaveMessagingSurface",
            Self::EnterConversation(_) => "enterConversation",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Payload of `sendMessage`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Recipient of the message.
    #[validate(custom(function = "non_empty_key"))]
    pub receiver_id: UserId,
    /// The message itself.
    #[validate(nested)]
    pub message: MessageDraft,
}

/// A chat message as submitted by the sender, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    /// Conversation the message belongs to.
    #[validate(custom(function = "non_empty_key"))]
    pub conversation_id: ConversationId,
    /// Sender as claimed by the client; must match the connection's user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserRef>,
    /// Message body.
    #[validate(length(min = 1))]
    pub content: String,
    /// Users who have already seen the message.
    #[serde(default)]
    pub seen_by: BTreeSet<UserId>,
}

impl MessageDraft {
    /// Turns the draft into a message sent by `sender`.
    pub fn into_message(self, sender: UserId) -> Message {
        Message::new(self.conversation_id, sender, self.content, self.seen_by)
    }
}

/// Payload of `sendFriendRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestPayload {
    /// Notification already created upstream for the receiver.
    pub notification: NotificationRecord,
}

/// Payload of `acceptFriendRequest`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcceptFriendRequestPayload {
    /// Notification telling the original requester the request was accepted.
    pub notification: NotificationRecord,
    /// The acting user's now-stale pending request notification.
    #[validate(custom(function = "non_empty_key"))]
    pub pending_notification_id: NotificationId,
}

/// Payload of `queryUserStatus`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryUserStatusPayload {
    /// User being asked about.
    #[validate(custom(function = "non_empty_key"))]
    pub user_id: UserId,
}

/// Payload of `queryFriendsStatus`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFriendsStatusPayload {
    /// Users to report on; the connection's friend list when absent.
    #[serde(default)]
    pub friends: Option<Vec<UserRef>>,
}

/// Payload of `startTyping` and `stopTyping`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    /// User the typing indicator is for.
    #[validate(custom(function = "non_empty_key"))]
    pub receiver_id: UserId,
    /// Conversation being typed in.
    #[validate(custom(function = "non_empty_key"))]
    pub conversation_id: ConversationId,
}

/// Payload of `enterConversation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterConversationPayload {
    /// Conversation now open; `None` closes the current one.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
}

/// Events sent by the relay to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutboundEvent {
    /// A chat message for the receiving user.
    MessageDelivered {
        /// The message.
        message: Message,
    },
    /// A durable notification was created for this user.
    NotificationDelivered {
        /// The notification with the sender snapshot attached.
        notification: NotificationRecord,
    },
    /// A friend request (or acceptance) for this user.
    FriendRequestDelivered {
        /// The notification with the sender snapshot attached.
        notification: NotificationRecord,
    },
    /// A notification is stale and should be removed from the UI.
    NotificationRetired {
        /// Notification ID.
        notification_id: NotificationId,
    },
    /// A user's presence changed, or the answer to `queryUserStatus`.
    PresenceChanged {
        /// User ID.
        user_id: UserId,
        /// New status.
        status: PresenceStatus,
    },
    /// Answer to `queryFriendsStatus`.
    FriendsStatusReport {
        /// Online users, in request order.
        online: Vec<UserId>,
        /// Offline users, in request order.
        offline: Vec<UserId>,
    },
    /// Someone is typing in the open conversation.
    TypingStarted {
        /// Conversation ID.
        conversation_id: ConversationId,
        /// Who is typing.
        user_id: UserId,
    },
    /// Someone stopped typing in the open conversation.
    TypingStopped {
        /// Conversation ID.
        conversation_id: ConversationId,
        /// Who stopped typing.
        user_id: UserId,
    },
    /// Something this connection asked for failed.
    LocalError {
        /// Machine-readable error code.
        code: String,
        /// Error description.
        message: String,
        /// Upstream payload or validation details.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_send_message_wire_shape() {
        let event: InboundEvent = serde_json::from_value(serde_json::json!({
            "event": "sendMessage",
            "receiverId": "bob",
            "message": {
                "conversationId": "c1",
                "sender": { "_id": "alice", "firstName": "Alice" },
                "content": "hi",
                "seenBy": ["alice"],
            },
        }))
        .unwrap();

        let InboundEvent::SendMessage(payload) = event else {
            panic!("wrong variant");
        };
        assert_eq!(payload.receiver_id, UserId::from("bob"));
        assert_eq!(
            payload.message.sender.as_ref().map(|s| s.id().clone()),
            Some(UserId::from("alice"))
        );
        assert!(payload.message.seen_by.contains(&UserId::from("alice")));
    }

    #[test]
    fn test_inbound_unit_events() {
        for name in ["publishPost", "enterMessagingSurface", "leaveMessagingSurface", "disconnect"] {
            let event: InboundEvent =
                serde_json::from_value(serde_json::json!({ "event": name })).unwrap();
            assert_eq!(event.name(), name);
        }
    }

    #[test]
    fn test_enter_conversation_without_id() {
        let event: InboundEvent =
            serde_json::from_value(serde_json::json!({ "event": "enterConversation" })).unwrap();
        let InboundEvent::EnterConversation(payload) = event else {
            panic!("wrong variant");
        };
        assert!(payload.conversation_id.is_none());
    }

    #[test]
    fn test_outbound_tagging() {
        let event = OutboundEvent::PresenceChanged {
            user_id: "alice".into(),
            status: PresenceStatus::Online,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "event": "presenceChanged", "userId": "alice", "status": "online" })
        );

        let event = OutboundEvent::LocalError {
            code: "VALIDATION".into(),
            message: "bad".into(),
            details: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "localError");
        assert!(json.get("details").is_none());
    }
}
