//! Top-level relay engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use relay_core::config::realtime::RealtimeConfig;
use relay_core::traits::RelayBackend;

use crate::connection::authenticator::ConnectionAuthenticator;
use crate::connection::registry::SharedRegistry;
use crate::metrics::{MetricsSnapshot, RelayMetrics};
use crate::router::EventRouter;

/// Owns one presence registry and everything that operates on it.
#[derive(Clone)]
pub struct RelayEngine {
    /// Event router.
    pub router: Arc<EventRouter>,
    /// Handshake authenticator.
    pub authenticator: ConnectionAuthenticator,
    /// Presence registry handle.
    pub registry: SharedRegistry,
    /// Metrics collector.
    pub metrics: Arc<RelayMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RelayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEngine").finish()
    }
}

impl RelayEngine {
    /// Creates a new relay engine over `backend`.
    pub fn new(config: RealtimeConfig, backend: Arc<dyn RelayBackend>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(RelayMetrics::new());
        let registry = SharedRegistry::new();
        let provider = backend.provider_name().to_string();
        let router = Arc::new(EventRouter::new(
            registry.clone(),
            backend,
            metrics.clone(),
            config,
        ));

        info!(provider = %provider, "Relay engine initialized");

        Self {
            router,
            authenticator: ConnectionAuthenticator::new(),
            registry,
            metrics,
            shutdown_tx,
        }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signals every connection task to stop, drops all connection records
    /// and returns the final counters.
    pub fn shutdown(&self) -> MetricsSnapshot {
        info!("Shutting down relay engine");

        let _ = self.shutdown_tx.send(());
        let dropped = self.registry.write(|r| r.drain());
        for _ in &dropped {
            self.metrics.connection_closed();
        }

        let snapshot = self.metrics.snapshot();
        info!(
            connections_dropped = dropped.len(),
            metrics = ?snapshot,
            "Relay engine shut down"
        );
        snapshot
    }
}
