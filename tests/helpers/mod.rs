//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use relay_core::config::AppConfig;
use relay_gateway::{AppState, build_app};
use relay_realtime::RelayEngine;
use relay_upstream::MemoryBackend;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A relay served on an ephemeral port over an in-memory backend.
pub struct TestApp {
    pub addr: SocketAddr,
    pub engine: RelayEngine,
    pub backend: Arc<MemoryBackend>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.server.handshake_timeout_seconds = 2;
        Self::with_config(config).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let engine = RelayEngine::new(config.realtime.clone(), backend.clone());
        let app = build_app(AppState::new(config, engine.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        Self {
            addr,
            engine,
            backend,
        }
    }

    /// Opens a raw socket without sending a handshake.
    pub async fn open(&self) -> Client {
        let (client, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("websocket connect");
        client
    }

    /// Opens a socket and authenticates as `user` with `friends`.
    pub async fn connect(&self, user: &str, friends: &[&str]) -> Client {
        let mut client = self.open().await;
        send(&mut client, handshake(user, friends)).await;
        client
    }
}

pub fn handshake(user: &str, friends: &[&str]) -> Value {
    json!({
        "user": {
            "userInfo": {
                "_id": user,
                "firstName": user.to_uppercase(),
                "lastName": "Test",
                "friends": friends,
            },
            "token": format!("token-{user}"),
        }
    })
}

pub async fn send(client: &mut Client, frame: Value) {
    client
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("send frame");
}

/// Next text frame as JSON; panics after two seconds of silence.
pub async fn recv(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket ended")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("json frame");
        }
    }
}

/// Receives frames until one carries `event`.
pub async fn recv_event(client: &mut Client, event: &str) -> Value {
    loop {
        let frame = recv(client).await;
        if frame["event"] == event {
            return frame;
        }
    }
}

/// Asserts nothing arrives within a short window.
pub async fn assert_silent(client: &mut Client) {
    let next = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(next.is_err(), "unexpected frame: {:?}", next);
}

/// Gives spawned frame handlers time to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
