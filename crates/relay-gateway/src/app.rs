//! Application builder: wires router + middleware + state into an Axum app.

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use relay_core::config::AppConfig;
use relay_core::error::AppError;
use relay_core::traits::RelayBackend;
use relay_realtime::RelayEngine;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Runs the relay until ctrl-c, then drops every connection.
pub async fn run_server(config: AppConfig, backend: Arc<dyn RelayBackend>) -> Result<(), AppError> {
    tracing::info!("Starting relay server...");
    config.validate()?;

    let engine = RelayEngine::new(config.realtime.clone(), backend);
    let addr = config.server.bind_address();
    let app = build_app(AppState::new(config, engine.clone()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Relay listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
