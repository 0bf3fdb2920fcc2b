//! # relay-gateway
//!
//! WebSocket transport adapter for the relay, built on Axum.
//!
//! Hosts a single upgrade route. Each socket authenticates with its first
//! frame, is registered with the event router, and from then on has its
//! inbound frames routed and its outbound channel drained into the socket.

pub mod app;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
