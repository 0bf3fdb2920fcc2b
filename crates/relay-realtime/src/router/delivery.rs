//! The delivery primitive: hand an outbound event to live connections.

use std::sync::Arc;

use relay_core::types::{ConnectionId, UserId};

use crate::connection::registry::SharedRegistry;
use crate::message::types::OutboundEvent;
use crate::metrics::RelayMetrics;

/// What happened when delivering to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The user had no live connection.
    Offline,
    /// Handed to this many connections.
    Delivered(usize),
    /// The user is online but no connection accepted the event.
    Dropped,
}

/// Delivers events against the registry's current state.
///
/// Every call re-reads the registry, so a connection that went away while a
/// handler was suspended is never written to.
#[derive(Debug, Clone)]
pub struct Delivery {
    registry: SharedRegistry,
    metrics: Arc<RelayMetrics>,
}

impl Delivery {
    /// Creates a delivery handle over `registry`.
    pub fn new(registry: SharedRegistry, metrics: Arc<RelayMetrics>) -> Self {
        Self { registry, metrics }
    }

    /// Delivers to one connection if it still exists.
    pub fn to_connection(&self, user: &UserId, conn_id: ConnectionId, event: OutboundEvent) -> bool {
        let sent = self
            .registry
            .read(|r| r.get(user, conn_id).map(|record| record.send(event)))
            .unwrap_or(false);
        if sent {
            self.metrics.events_delivered(1);
        }
        sent
    }

    /// Delivers to those of `targets` that are still connected.
    pub fn to_connections(
        &self,
        user: &UserId,
        targets: &[ConnectionId],
        event: &OutboundEvent,
    ) -> DeliveryOutcome {
        self.send_where(user, event, |id| targets.contains(&id))
    }

    /// Delivers to every current connection of `user`.
    pub fn to_user(&self, user: &UserId, event: &OutboundEvent) -> DeliveryOutcome {
        self.send_where(user, event, |_| true)
    }

    fn send_where(
        &self,
        user: &UserId,
        event: &OutboundEvent,
        include: impl Fn(ConnectionId) -> bool,
    ) -> DeliveryOutcome {
        let (matched, sent) = self.registry.read(|r| {
            let mut matched = 0;
            let mut sent = 0;
            for record in r.records(user).iter().filter(|rec| include(rec.id)) {
                matched += 1;
                if record.send(event.clone()) {
                    sent += 1;
                }
            }
            (matched, sent)
        });

        self.metrics.events_delivered(sent);
        match (matched, sent) {
            (0, _) => DeliveryOutcome::Offline,
            (_, 0) => DeliveryOutcome::Dropped,
            (_, n) => DeliveryOutcome::Delivered(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::record::tests::record_for;

    fn typing() -> OutboundEvent {
        OutboundEvent::TypingStarted {
            conversation_id: "c".into(),
            user_id: "alice".into(),
        }
    }

    #[test]
    fn test_offline_user() {
        let delivery = Delivery::new(SharedRegistry::new(), Arc::new(RelayMetrics::new()));
        assert_eq!(
            delivery.to_user(&"bob".into(), &typing()),
            DeliveryOutcome::Offline
        );
    }

    #[test]
    fn test_targets_filter_and_recheck() {
        let registry = SharedRegistry::new();
        let metrics = Arc::new(RelayMetrics::new());
        let delivery = Delivery::new(registry.clone(), metrics.clone());
        let bob = UserId::from("bob");

        let (r1, mut rx1) = record_for("bob", &[]);
        let (r2, mut rx2) = record_for("bob", &[]);
        let (id1, id2) = (r1.id, r2.id);
        registry.write(|r| {
            r.add_connection(bob.clone(), r1);
            r.add_connection(bob.clone(), r2);
        });

        assert_eq!(
            delivery.to_connections(&bob, &[id2], &typing()),
            DeliveryOutcome::Delivered(1)
        );
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());

        registry.write(|r| r.remove_connection(&bob, id2));
        assert_eq!(
            delivery.to_connections(&bob, &[id2], &typing()),
            DeliveryOutcome::Offline
        );
        assert!(!delivery.to_connection(&bob, id2, typing()));
        assert!(delivery.to_connection(&bob, id1, typing()));
        assert_eq!(metrics.snapshot().events_delivered, 2);
    }

    #[test]
    fn test_dropped_when_channel_closed() {
        let registry = SharedRegistry::new();
        let delivery = Delivery::new(registry.clone(), Arc::new(RelayMetrics::new()));
        let (record, rx) = record_for("bob", &[]);
        registry.write(|r| r.add_connection("bob".into(), record));
        drop(rx);
        assert_eq!(
            delivery.to_user(&"bob".into(), &typing()),
            DeliveryOutcome::Dropped
        );
    }
}
