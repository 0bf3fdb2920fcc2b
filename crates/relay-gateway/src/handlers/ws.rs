//! WebSocket upgrade handler.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, warn};

use relay_core::error::AppError;
use relay_realtime::message::serializer::serialize_outbound;

use crate::state::AppState;

/// Close code sent when the handshake is missing or invalid.
pub const CLOSE_UNAUTHENTICATED: u16 = 4001;

/// Longest close reason a control frame can carry.
const MAX_CLOSE_REASON: usize = 123;

/// GET /ws: WebSocket upgrade
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.max_message_size(state.config.realtime.max_frame_size)
        .on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Reads frames until the first text frame, which must be the handshake.
async fn read_handshake(socket: &mut WebSocket) -> Option<String> {
    while let Some(frame) = socket.recv().await {
        match frame {
            Ok(Message::Text(text)) => return Some(text.to_string()),
            Ok(Message::Binary(bytes)) => return Some(String::from_utf8_lossy(&bytes).into_owned()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}

/// Truncates `reason` on a char boundary to fit a close frame.
fn close_reason(reason: &str) -> String {
    let mut end = reason.len().min(MAX_CLOSE_REASON);
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    reason[..end].to_string()
}

async fn reject(mut socket: WebSocket, err: &AppError) {
    warn!(error = %err, "Rejecting WebSocket connection");
    let frame = CloseFrame {
        code: CLOSE_UNAUTHENTICATED,
        reason: close_reason(&err.message).into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, mut socket: WebSocket) {
    let handshake_timeout = Duration::from_secs(state.config.server.handshake_timeout_seconds);
    let auth = match tokio::time::timeout(handshake_timeout, read_handshake(&mut socket)).await {
        Ok(Some(raw)) => state.engine.authenticator.authenticate(&raw),
        Ok(None) => {
            debug!("WebSocket closed before handshake");
            return;
        }
        Err(_) => Err(AppError::authentication("Handshake not received in time")),
    };
    let auth = match auth {
        Ok(auth) => auth,
        Err(err) => {
            reject(socket, &err).await;
            return;
        }
    };

    let user_id = auth.user_id.clone();
    let (tx, mut outbound_rx) = mpsc::channel(state.config.realtime.outbound_buffer_size);
    let conn_id = state.engine.router.connect(auth, tx).await;
    let mut shutdown = state.engine.shutdown_receiver();

    info!(
        conn_id = %conn_id,
        user_id = %user_id,
        "WebSocket connection established"
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let inflight = Arc::new(Semaphore::new(state.config.realtime.max_inflight_events));

    // Ends once the registry drops this connection's record.
    let mut outbound_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serialize_outbound(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Failed to serialize outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    // Stop reading while this connection is at its in-flight limit.
                    let Ok(permit) = inflight.clone().acquire_owned().await else {
                        break;
                    };
                    let router = state.engine.router.clone();
                    let user = user_id.clone();
                    tokio::spawn(async move {
                        router.handle_inbound(&user, conn_id, text.as_str()).await;
                        drop(permit);
                    });
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = &mut outbound_task => break,
            _ = shutdown.recv() => break,
        }
    }

    outbound_task.abort();
    state.engine.router.disconnect(&user_id, conn_id).await;

    info!(
        conn_id = %conn_id,
        user_id = %user_id,
        "WebSocket connection closed"
    );
}
