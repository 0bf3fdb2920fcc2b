//! Relay engine counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters. Lock-free; shared by the router and broadcaster.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    connections_retired: AtomicU64,
    events_received: AtomicU64,
    events_delivered: AtomicU64,
    notifications_created: AtomicU64,
    local_errors: AtomicU64,
}

impl RelayMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly registered connection
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removed connection
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection retired by the per-user cap
    pub fn connection_retired(&self) {
        self.connections_retired.fetch_add(1, Ordering::Relaxed);
        self.connection_closed();
    }

    /// Record an inbound frame
    pub fn event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record outbound events handed to connections
    pub fn events_delivered(&self, count: usize) {
        self.events_delivered
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a notification created upstream
    pub fn notification_created(&self) {
        self.notifications_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a `localError` sent to a client
    pub fn local_error(&self) {
        self.local_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        MetricsSnapshot {
            connections_opened: opened,
            connections_closed: closed,
            connections_active: opened.saturating_sub(closed),
            connections_retired: self.connections_retired.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            notifications_created: self.notifications_created.load(Ordering::Relaxed),
            local_errors: self.local_errors.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever registered
    pub connections_opened: u64,
    /// Connections removed (closed or retired)
    pub connections_closed: u64,
    /// Currently registered connections
    pub connections_active: u64,
    /// Connections retired by the per-user cap
    pub connections_retired: u64,
    /// Inbound frames received
    pub events_received: u64,
    /// Outbound events handed to connections
    pub events_delivered: u64,
    /// Notifications created upstream
    pub notifications_created: u64,
    /// `localError` events sent
    pub local_errors: u64,
}
