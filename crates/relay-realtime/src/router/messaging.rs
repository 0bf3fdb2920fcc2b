//! Chat message routing and typing indicators.

use tracing::{debug, info};

use relay_core::error::AppError;
use relay_core::result::AppResult;
use relay_core::types::{ConnectionId, Message, NotificationType, UserId};

use crate::connection::record::ConnectionRecord;
use crate::message::types::{OutboundEvent, SendMessagePayload, TypingPayload};

use super::EventRouter;
use super::tier::{DeliveryTier, classify};

impl EventRouter {
    /// Routes a chat message by the receiver's connection state.
    ///
    /// Live delivery always happens before persistence. Upstream failures are
    /// returned to the sender and never undo a delivery already made.
    pub(super) async fn send_message(
        &self,
        actor: &ConnectionRecord,
        payload: SendMessagePayload,
    ) -> AppResult<()> {
        if let Some(claimed) = &payload.message.sender {
            if claimed.id() != &actor.user_id {
                return Err(AppError::validation(format!(
                    "Message sender {} does not match connection user {}",
                    claimed.id(),
                    actor.user_id
                )));
            }
        }

        let receiver = payload.receiver_id;
        let mut message = payload.message.into_message(actor.user_id.clone());
        let snapshot = self.registry.connections_of(&receiver);
        let decision = classify(&snapshot, &message.conversation_id);

        info!(
            conn_id = %actor.id,
            user_id = %actor.user_id,
            receiver_id = %receiver,
            conversation_id = %message.conversation_id,
            tier = %decision.tier,
            targets = decision.targets.len(),
            "Routing message"
        );

        match decision.tier {
            DeliveryTier::SameConversation => {
                message.mark_seen_by(receiver.clone());
                self.deliver_message(&receiver, &decision.targets, &message);
                self.persist(actor, &message).await
            }
            DeliveryTier::MessagingSurface => {
                self.deliver_message(&receiver, &decision.targets, &message);
                self.persist(actor, &message).await
            }
            DeliveryTier::Unreachable => self.notify_unreachable(actor, &receiver, &message).await,
        }
    }

    fn deliver_message(&self, receiver: &UserId, targets: &[ConnectionId], message: &Message) {
        let event = OutboundEvent::MessageDelivered {
            message: message.clone(),
        };
        let outcome = self.delivery.to_connections(receiver, targets, &event);
        debug!(receiver_id = %receiver, outcome = ?outcome, "Message delivered live");
    }

    async fn persist(&self, actor: &ConnectionRecord, message: &Message) -> AppResult<()> {
        let stored = self.backend.create_message(message, &actor.credential).await?;
        debug!(
            user_id = %actor.user_id,
            message_id = ?stored.id,
            "Message persisted"
        );
        Ok(())
    }

    /// Tier three: persist, and create a message notification unless an
    /// unread one already exists.
    async fn notify_unreachable(
        &self,
        actor: &ConnectionRecord,
        receiver: &UserId,
        message: &Message,
    ) -> AppResult<()> {
        let exists = match self
            .coordinator
            .has_unread_message_notification(receiver, &actor.credential)
            .await
        {
            Ok(exists) => exists,
            Err(err) => {
                // Keep the message; skip the notification rather than risk a duplicate.
                self.local_error(actor, &err);
                return self.persist(actor, message).await;
            }
        };

        if exists {
            debug!(receiver_id = %receiver, "Unread message notification exists, persisting only");
            return self.persist(actor, message).await;
        }

        let (persisted, created) = tokio::join!(
            self.persist(actor, message),
            self.coordinator.create_notification(
                receiver,
                &actor.credential,
                &actor.profile,
                NotificationType::Message,
            ),
        );

        match created {
            Ok(notification) => {
                let outcome = self
                    .delivery
                    .to_user(receiver, &OutboundEvent::NotificationDelivered { notification });
                debug!(receiver_id = %receiver, outcome = ?outcome, "Message notification delivered");
            }
            Err(err) => self.local_error(actor, &err),
        }
        persisted
    }

    /// Relays a typing indicator to receiver connections that have the
    /// conversation open. Best-effort; nothing is reported back.
    pub(super) fn typing(&self, actor: &ConnectionRecord, payload: TypingPayload, started: bool) {
        let targets: Vec<_> = self
            .registry
            .connections_of(&payload.receiver_id)
            .iter()
            .filter(|r| r.is_in_conversation(&payload.conversation_id))
            .map(|r| r.id)
            .collect();
        if targets.is_empty() {
            return;
        }

        let event = if started {
            OutboundEvent::TypingStarted {
                conversation_id: payload.conversation_id,
                user_id: actor.user_id.clone(),
            }
        } else {
            OutboundEvent::TypingStopped {
                conversation_id: payload.conversation_id,
                user_id: actor.user_id.clone(),
            }
        };
        self.delivery
            .to_connections(&payload.receiver_id, &targets, &event);
    }
}
