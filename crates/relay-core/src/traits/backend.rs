//! Upstream persistence API trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{Credential, Message, NotificationRecord, NotificationType, UserId};

/// The external API that owns messages, notifications and friend lists.
///
/// Every call carries the bearer credential of the connection acting on
/// the user's behalf. Implementations are responsible for bounding each
/// call with a timeout and mapping non-success responses into
/// [`crate::AppError`] values of kind `ExternalService` or `Timeout`.
#[async_trait]
pub trait RelayBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a chat message. Returns the stored message with its
    /// server-assigned ID.
    async fn create_message(&self, message: &Message, credential: &Credential)
    -> AppResult<Message>;

    /// Whether an unread message notification already exists for `receiver`.
    async fn has_unread_message_notification(
        &self,
        receiver: &UserId,
        credential: &Credential,
    ) -> AppResult<bool>;

    /// Create a notification of `kind` for `receiver`. The returned record
    /// carries only a bare sender reference.
    async fn create_notification(
        &self,
        receiver: &UserId,
        kind: NotificationType,
        credential: &Credential,
    ) -> AppResult<NotificationRecord>;

    /// Fetch a user's friend list.
    async fn friends_of(&self, user: &UserId, credential: &Credential) -> AppResult<Vec<UserId>>;

    /// Short provider name for logging.
    fn provider_name(&self) -> &str;
}
