//! Event router: connection lifecycle and per-event dispatch.

pub mod delivery;
pub mod tier;

mod messaging;
mod presence;
mod social;
mod surface;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use relay_core::config::realtime::RealtimeConfig;
use relay_core::error::AppError;
use relay_core::traits::RelayBackend;
use relay_core::types::{ConnectionId, UserId};

use crate::connection::authenticator::AuthenticatedConnection;
use crate::connection::record::ConnectionRecord;
use crate::connection::registry::SharedRegistry;
use crate::message::types::{InboundEvent, OutboundEvent};
use crate::message::validator::parse_inbound;
use crate::metrics::RelayMetrics;
use crate::notification::coordinator::NotificationCoordinator;
use crate::presence::broadcaster::PresenceBroadcaster;
use crate::presence::status::PresenceStatus;

use self::delivery::Delivery;

/// Routes inbound events against the presence registry.
///
/// Handlers snapshot the acting connection and the recipient's connections
/// before their first upstream call and deliver through [`Delivery`], which
/// re-checks the registry, so state that changed while a handler was
/// suspended is respected.
#[derive(Debug)]
pub struct EventRouter {
    /// Presence registry handle
    registry: SharedRegistry,
    /// Upstream API
    backend: Arc<dyn RelayBackend>,
    /// Notification coordinator
    coordinator: NotificationCoordinator,
    /// Presence broadcaster
    broadcaster: PresenceBroadcaster,
    /// Delivery primitive
    delivery: Delivery,
    /// Metrics
    metrics: Arc<RelayMetrics>,
    /// Configuration
    config: RealtimeConfig,
}

impl EventRouter {
    /// Creates a router over `registry`.
    pub fn new(
        registry: SharedRegistry,
        backend: Arc<dyn RelayBackend>,
        metrics: Arc<RelayMetrics>,
        config: RealtimeConfig,
    ) -> Self {
        let delivery = Delivery::new(registry.clone(), metrics.clone());
        Self {
            coordinator: NotificationCoordinator::new(backend.clone(), metrics.clone()),
            broadcaster: PresenceBroadcaster::new(delivery.clone()),
            registry,
            backend,
            delivery,
            metrics,
            config,
        }
    }

    /// The registry this router reads and mutates.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Registers an authenticated connection whose events will be written to
    /// `sender`, and announces the user to their friends if this is their
    /// first connection.
    pub async fn connect(
        &self,
        mut auth: AuthenticatedConnection,
        sender: mpsc::Sender<OutboundEvent>,
    ) -> ConnectionId {
        let friends = match auth.friends.take() {
            Some(friends) => friends,
            None => self
                .backend
                .friends_of(&auth.user_id, &auth.credential)
                .await
                .unwrap_or_else(|e| {
                    warn!(user_id = %auth.user_id, error = %e, "Friend list unavailable, continuing without");
                    Vec::new()
                }),
        };

        let record = ConnectionRecord::new(auth, friends, sender);
        let conn_id = record.id;
        let user_id = record.user_id.clone();
        let friends = record.friends.clone();
        let max = self.config.max_connections_per_user;

        let (first, retired) = self.registry.write(|r| {
            let was_online = r.is_online(&user_id);
            let mut retired = Vec::new();
            while max > 0 && r.connection_count_of(&user_id) >= max {
                let Some(oldest) = r.records(&user_id).first().map(|rec| rec.id) else {
                    break;
                };
                if let Some(removed) = r.remove_connection(&user_id, oldest) {
                    retired.push(removed.record.id);
                }
            }
            r.add_connection(user_id.clone(), record);
            (!was_online, retired)
        });

        for old in &retired {
            self.metrics.connection_retired();
            warn!(
                user_id = %user_id,
                conn_id = %old,
                max,
                "User at max connections, oldest connection retired"
            );
        }
        self.metrics.connection_opened();
        info!(
            conn_id = %conn_id,
            user_id = %user_id,
            first,
            friends = friends.len(),
            "Connection registered"
        );

        if first {
            self.broadcaster
                .broadcast(&user_id, &friends, PresenceStatus::Online)
                .await;
        }
        conn_id
    }

    /// Removes a connection and, if it was the user's last, announces the
    /// user offline. Unknown connections are a no-op.
    pub async fn disconnect(&self, user: &UserId, conn_id: ConnectionId) -> bool {
        let Some(removed) = self.registry.write(|r| r.remove_connection(user, conn_id)) else {
            debug!(user_id = %user, conn_id = %conn_id, "Disconnect for unknown connection");
            return false;
        };

        self.metrics.connection_closed();
        info!(
            conn_id = %conn_id,
            user_id = %user,
            last = removed.was_last,
            "Connection unregistered"
        );

        if removed.was_last {
            self.broadcaster
                .broadcast(user, &removed.record.friends, PresenceStatus::Offline)
                .await;
        }
        true
    }

    /// Decodes, validates and dispatches one inbound frame. Frames that fail
    /// decoding or validation are answered with `localError` before any
    /// registry or upstream interaction.
    pub async fn handle_inbound(&self, user: &UserId, conn_id: ConnectionId, raw: &str) {
        self.metrics.event_received();
        match parse_inbound(raw, &self.config) {
            Ok(event) => self.dispatch(user, conn_id, event).await,
            Err(err) => {
                debug!(conn_id = %conn_id, user_id = %user, error = %err, "Rejected inbound frame");
                self.send_local_error(user, conn_id, &err);
            }
        }
    }

    /// Dispatches one decoded event from connection `conn_id` of `user`.
    pub async fn dispatch(&self, user: &UserId, conn_id: ConnectionId, event: InboundEvent) {
        let Some(actor) = self.registry.record(user, conn_id) else {
            warn!(conn_id = %conn_id, user_id = %user, event = event.name(), "Event from unknown connection");
            return;
        };
        debug!(conn_id = %conn_id, user_id = %user, event = event.name(), "Dispatching event");

        let result = match event {
            InboundEvent::SendMessage(payload) => self.send_message(&actor, payload).await,
            InboundEvent::PublishPost => {
                self.publish_post(&actor).await;
                Ok(())
            }
            InboundEvent::SendFriendRequest(payload) => {
                self.send_friend_request(&actor, payload);
                Ok(())
            }
            InboundEvent::AcceptFriendRequest(payload) => {
                self.accept_friend_request(&actor, payload);
                Ok(())
            }
            InboundEvent::QueryUserStatus(payload) => {
                self.query_user_status(&actor, payload);
                Ok(())
            }
            InboundEvent::QueryFriendsStatus(payload) => {
                self.query_friends_status(&actor, payload);
                Ok(())
            }
            InboundEvent::StartTyping(payload) => {
                self.typing(&actor, payload, true);
                Ok(())
            }
            InboundEvent::StopTyping(payload) => {
                self.typing(&actor, payload, false);
                Ok(())
            }
            InboundEvent::EnterMessagingSurface => {
                self.enter_messaging_surface(&actor);
                Ok(())
            }
            InboundEvent::LeaveMessagingSurface => {
                self.leave_messaging_surface(&actor);
                Ok(())
            }
            InboundEvent::EnterConversation(payload) => {
                self.enter_conversation(&actor, payload.conversation_id);
                Ok(())
            }
            InboundEvent::Disconnect => {
                self.disconnect(user, conn_id).await;
                Ok(())
            }
        };

        if let Err(err) = result {
            self.local_error(&actor, &err);
        }
    }

    /// Reports `err` to the acting connection only.
    pub(crate) fn local_error(&self, actor: &ConnectionRecord, err: &AppError) {
        warn!(
            conn_id = %actor.id,
            user_id = %actor.user_id,
            code = %err.code(),
            error = %err,
            "Reporting local error"
        );
        self.send_local_error(&actor.user_id, actor.id, err);
    }

    fn send_local_error(&self, user: &UserId, conn_id: ConnectionId, err: &AppError) {
        self.metrics.local_error();
        let event = OutboundEvent::LocalError {
            code: err.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        };
        self.delivery.to_connection(user, conn_id, event);
    }
}
