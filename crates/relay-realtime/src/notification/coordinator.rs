//! Notification coordinator: decides and creates durable notifications
//! through the upstream API.

use std::sync::Arc;

use tracing;

use relay_core::result::AppResult;
use relay_core::traits::RelayBackend;
use relay_core::types::{Credential, NotificationRecord, NotificationType, SenderSnapshot, UserId};

use crate::metrics::RelayMetrics;

/// Creates notifications for users who cannot take an event live.
///
/// Deduplication of message notifications is check-then-act against the
/// upstream API: two sends that both observe "no unread notification" before
/// either creation lands will create two notifications. This is accepted.
#[derive(Debug, Clone)]
pub struct NotificationCoordinator {
    /// Upstream API
    backend: Arc<dyn RelayBackend>,
    /// Metrics
    metrics: Arc<RelayMetrics>,
}

impl NotificationCoordinator {
    /// Create a new coordinator
    pub fn new(backend: Arc<dyn RelayBackend>, metrics: Arc<RelayMetrics>) -> Self {
        Self { backend, metrics }
    }

    /// Whether `receiver` already has an unread message notification.
    pub async fn has_unread_message_notification(
        &self,
        receiver: &UserId,
        credential: &Credential,
    ) -> AppResult<bool> {
        let exists = self
            .backend
            .has_unread_message_notification(receiver, credential)
            .await?;
        tracing::debug!(receiver_id = %receiver, exists, "Checked unread message notification");
        Ok(exists)
    }

    /// Create a notification for `receiver` and attach the sender's profile.
    pub async fn create_notification(
        &self,
        receiver: &UserId,
        credential: &Credential,
        sender: &SenderSnapshot,
        kind: NotificationType,
    ) -> AppResult<NotificationRecord> {
        let record = self
            .backend
            .create_notification(receiver, kind, credential)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    receiver_id = %receiver,
                    sender_id = %sender.id,
                    error = %e,
                    "Failed to create notification"
                );
            })?;

        self.metrics.notification_created();
        tracing::debug!(
            receiver_id = %receiver,
            notification_id = %record.id,
            "Notification created"
        );
        Ok(record.attach_sender(sender.clone()))
    }
}
