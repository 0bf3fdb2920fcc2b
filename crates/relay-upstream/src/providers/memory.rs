//! In-memory upstream provider.
//!
//! Keeps messages, notifications and friend lists in process memory and
//! records every call it receives. Failures can be scripted per operation
//! or per receiver, which makes it the backend of choice for router tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use relay_core::error::AppError;
use relay_core::result::AppResult;
use relay_core::traits::RelayBackend;
use relay_core::types::{
    Credential, Message, MessageId, NotificationId, NotificationRecord, NotificationType, UserId,
};

/// One call observed by the memory backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendCall {
    /// `create_message` for a conversation.
    CreateMessage,
    /// `has_unread_message_notification` for a receiver.
    CheckUnread(UserId),
    /// `create_notification` for a receiver.
    CreateNotification(UserId, NotificationType),
    /// `friends_of` for a user.
    FetchFriends(UserId),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<BackendCall>,
    messages: Vec<Message>,
    notifications: Vec<NotificationRecord>,
    unread_message_receivers: HashSet<UserId>,
    friends: HashMap<UserId, Vec<UserId>>,
    fail_messages: bool,
    fail_checks: bool,
    fail_notifications_for: HashSet<UserId>,
    delay: Option<Duration>,
    next_id: u64,
}

/// Process-local backend. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a user's friend list.
    pub fn set_friends(&self, user: impl Into<UserId>, friends: Vec<UserId>) {
        self.lock().friends.insert(user.into(), friends);
    }

    /// Make every `create_message` call fail.
    pub fn fail_messages(&self, fail: bool) {
        self.lock().fail_messages = fail;
    }

    /// Make every `has_unread_message_notification` call fail.
    pub fn fail_checks(&self, fail: bool) {
        self.lock().fail_checks = fail;
    }

    /// Make `create_notification` fail for one receiver.
    pub fn fail_notifications_for(&self, receiver: impl Into<UserId>) {
        self.lock().fail_notifications_for.insert(receiver.into());
    }

    /// Delay every call, so callers suspend the way they would on a network call.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Mark a receiver's message notifications as read.
    pub fn mark_read(&self, receiver: &UserId) {
        self.lock().unread_message_receivers.remove(receiver);
    }

    /// All calls observed so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// All persisted messages, in order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// All created notifications, in order.
    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.lock().notifications.clone()
    }

    /// Notifications created for one receiver.
    pub fn notifications_for(&self, receiver: &UserId) -> Vec<NotificationRecord> {
        self.lock()
            .notifications
            .iter()
            .filter(|n| &n.receiver == receiver)
            .cloned()
            .collect()
    }

    async fn pause(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RelayBackend for MemoryBackend {
    async fn create_message(
        &self,
        message: &Message,
        _credential: &Credential,
    ) -> AppResult<Message> {
        self.pause().await;
        let mut state = self.lock();
        state.calls.push(BackendCall::CreateMessage);
        if state.fail_messages {
            return Err(AppError::external("create message returned 500 Internal Server Error")
                .with_details(serde_json::json!({ "message": "Message could not be saved" })));
        }

        state.next_id += 1;
        let mut stored = message.clone();
        stored.id = Some(MessageId::new(format!("msg-{}", state.next_id)));
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn has_unread_message_notification(
        &self,
        receiver: &UserId,
        _credential: &Credential,
    ) -> AppResult<bool> {
        self.pause().await;
        let mut state = self.lock();
        state.calls.push(BackendCall::CheckUnread(receiver.clone()));
        if state.fail_checks {
            return Err(AppError::timeout("check existing notification timed out"));
        }
        Ok(state.unread_message_receivers.contains(receiver))
    }

    async fn create_notification(
        &self,
        receiver: &UserId,
        kind: NotificationType,
        _credential: &Credential,
    ) -> AppResult<NotificationRecord> {
        self.pause().await;
        let mut state = self.lock();
        state
            .calls
            .push(BackendCall::CreateNotification(receiver.clone(), kind));
        if state.fail_notifications_for.contains(receiver) {
            return Err(AppError::external("create notification returned 404 Not Found")
                .with_details(serde_json::json!({ "message": "Receiver not found" })));
        }

        state.next_id += 1;
        let record = NotificationRecord {
            id: NotificationId::new(format!("notif-{}", state.next_id)),
            receiver: receiver.clone(),
            sender: None,
            notification_type: kind,
            extra: serde_json::Map::new(),
        };
        if kind == NotificationType::Message {
            state.unread_message_receivers.insert(receiver.clone());
        }
        state.notifications.push(record.clone());
        Ok(record)
    }

    async fn friends_of(&self, user: &UserId, _credential: &Credential) -> AppResult<Vec<UserId>> {
        self.pause().await;
        let mut state = self.lock();
        state.calls.push(BackendCall::FetchFriends(user.clone()));
        state
            .friends
            .get(user)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No friend list for user {user}")))
    }

    fn provider_name(&self) -> &str {
        "memory"
    }
}
