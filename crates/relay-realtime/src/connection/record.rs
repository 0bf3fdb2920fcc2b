//! Per-connection state held by the presence registry.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use relay_core::types::{ConnectionId, ConversationId, Credential, SenderSnapshot, UserId};

use crate::message::types::OutboundEvent;

use super::authenticator::AuthenticatedConnection;

/// State of one live connection.
///
/// Holds the sender half of the connection's outbound channel plus what the
/// user is currently doing on that device. Cloning a record produces a
/// snapshot; mutations only ever happen on the copy owned by the registry.
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: UserId,
    /// Credential forwarded upstream on this connection's behalf
    pub credential: Credential,
    /// Display profile presented at authentication
    pub profile: SenderSnapshot,
    /// Friend list snapshotted at connection time
    pub friends: Vec<UserId>,
    /// Conversation currently open, only meaningful on the messaging surface
    current_conversation: Option<ConversationId>,
    /// Whether the user is anywhere inside the messaging UI
    on_messaging_surface: bool,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Sender for outbound events
    sender: mpsc::Sender<OutboundEvent>,
}

impl ConnectionRecord {
    /// Create a record for a freshly authenticated connection.
    pub fn new(
        auth: AuthenticatedConnection,
        friends: Vec<UserId>,
        sender: mpsc::Sender<OutboundEvent>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id: auth.user_id,
            credential: auth.credential,
            profile: auth.profile,
            friends,
            current_conversation: None,
            on_messaging_surface: false,
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Hand an event to the transport. Never blocks.
    pub fn send(&self, event: OutboundEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(_) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Connection send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(conn_id = %self.id, "Connection channel closed");
                false
            }
        }
    }

    /// Conversation currently open on this connection.
    pub fn current_conversation(&self) -> Option<&ConversationId> {
        self.current_conversation.as_ref()
    }

    /// Whether this connection is inside the messaging UI.
    pub fn is_on_messaging_surface(&self) -> bool {
        self.on_messaging_surface
    }

    /// Whether this connection has `conversation` open.
    pub fn is_in_conversation(&self, conversation: &ConversationId) -> bool {
        self.current_conversation.as_ref() == Some(conversation)
    }

    /// The user opened the messaging UI.
    pub fn enter_messaging_surface(&mut self) {
        self.on_messaging_surface = true;
    }

    /// The user left the messaging UI; any open conversation is closed too.
    pub fn leave_messaging_surface(&mut self) {
        self.on_messaging_surface = false;
        self.current_conversation = None;
    }

    /// Open `conversation`, or close the current one with `None`.
    ///
    /// Opening a conversation implies being on the messaging surface.
    pub fn enter_conversation(&mut self, conversation: Option<ConversationId>) {
        if conversation.is_some() {
            self.on_messaging_surface = true;
        }
        self.current_conversation = conversation;
    }
}
