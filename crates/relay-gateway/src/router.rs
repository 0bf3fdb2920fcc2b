//! Route table.

use axum::Router;
use axum::routing::get;

use crate::handlers::ws::ws_handler;
use crate::state::AppState;

/// Builds the route table.
pub fn build_router(state: AppState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}
