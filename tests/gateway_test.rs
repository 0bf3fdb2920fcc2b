//! Integration tests for the WebSocket gateway.

mod helpers;

use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

use helpers::{TestApp, assert_silent, recv, recv_event, send, settle};

async fn expect_close_code(client: &mut helpers::Client, expected: u16) {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(3), client.next())
            .await
            .expect("timed out waiting for close");
        match frame {
            Some(Ok(Message::Close(Some(close)))) => {
                assert_eq!(u16::from(close.code), expected);
                return;
            }
            Some(Ok(Message::Close(None))) | None | Some(Err(_)) => {
                panic!("socket closed without code {expected}")
            }
            Some(Ok(_)) => {}
        }
    }
}

#[tokio::test]
async fn test_presence_announced_to_connected_friend() {
    let app = TestApp::new().await;
    let mut bob = app.connect("bob", &["alice"]).await;
    settle().await;

    let mut alice = app.connect("alice", &["bob"]).await;

    let frame = recv_event(&mut bob, "presenceChanged").await;
    assert_eq!(frame["userId"], "alice");
    assert_eq!(frame["status"], "online");

    alice.close(None).await.expect("close");
    let frame = recv_event(&mut bob, "presenceChanged").await;
    assert_eq!(frame["userId"], "alice");
    assert_eq!(frame["status"], "offline");
}

#[tokio::test]
async fn test_invalid_handshake_closes_with_4001() {
    let app = TestApp::new().await;
    let mut client = app.open().await;
    send(&mut client, json!({ "user": { "token": "t" } })).await;
    expect_close_code(&mut client, 4001).await;
    assert_eq!(app.engine.registry.read(|r| r.connection_count()), 0);
}

#[tokio::test]
async fn test_missing_handshake_times_out_with_4001() {
    let mut config = relay_core::config::AppConfig::default();
    config.server.handshake_timeout_seconds = 1;
    let app = TestApp::with_config(config).await;
    let mut client = app.open().await;
    expect_close_code(&mut client, 4001).await;
}

#[tokio::test]
async fn test_message_routed_to_open_conversation() {
    let app = TestApp::new().await;
    let mut bob = app.connect("bob", &["alice"]).await;
    settle().await;
    let mut alice = app.connect("alice", &["bob"]).await;
    recv_event(&mut bob, "presenceChanged").await;

    send(&mut bob, json!({ "event": "enterConversation", "conversationId": "c1" })).await;
    settle().await;

    send(
        &mut alice,
        json!({
            "event": "sendMessage",
            "receiverId": "bob",
            "message": { "conversationId": "c1", "sender": "alice", "content": "hello" },
        }),
    )
    .await;

    let frame = recv_event(&mut bob, "messageDelivered").await;
    assert_eq!(frame["message"]["content"], "hello");
    assert_eq!(frame["message"]["sender"], "alice");
    let seen: Vec<_> = frame["message"]["seenBy"]
        .as_array()
        .expect("seenBy array")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(seen.contains(&"bob"));

    settle().await;
    assert_eq!(app.backend.messages().len(), 1);
    assert!(app.backend.notifications().is_empty());
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_unreachable_receiver_gets_notification() {
    let app = TestApp::new().await;
    let mut bob = app.connect("bob", &[]).await;
    let mut alice = app.connect("alice", &[]).await;
    settle().await;

    send(
        &mut alice,
        json!({
            "event": "sendMessage",
            "receiverId": "bob",
            "message": { "conversationId": "c1", "content": "ping" },
        }),
    )
    .await;

    let frame = recv_event(&mut bob, "notificationDelivered").await;
    assert_eq!(frame["notification"]["receiver"], "bob");
    assert_eq!(frame["notification"]["sender"]["_id"], "alice");
    assert_eq!(app.backend.messages().len(), 1);
}

#[tokio::test]
async fn test_malformed_frame_reports_local_error() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice", &[]).await;
    settle().await;

    send(&mut alice, json!({ "event": "teleport" })).await;
    let frame = recv(&mut alice).await;
    assert_eq!(frame["event"], "localError");
    assert_eq!(frame["code"], "INVALID_EVENT");

    // the connection survives
    send(&mut alice, json!({ "event": "queryUserStatus", "userId": "alice" })).await;
    let frame = recv(&mut alice).await;
    assert_eq!(frame["event"], "presenceChanged");
    assert_eq!(frame["status"], "online");
}

#[tokio::test]
async fn test_shutdown_closes_sockets() {
    let app = TestApp::new().await;
    let mut alice = app.connect("alice", &[]).await;
    settle().await;
    assert_eq!(app.engine.registry.read(|r| r.connection_count()), 1);

    let snapshot = app.engine.shutdown();
    assert_eq!(snapshot.connections_active, 0);

    let ended = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(Ok(frame)) = alice.next().await {
            if matches!(frame, Message::Close(_)) {
                break;
            }
        }
    })
    .await;
    assert!(ended.is_ok());
}

#[tokio::test]
async fn test_zero_outbound_buffer_is_refused_before_serving() {
    let mut config = relay_core::config::AppConfig::default();
    config.realtime.outbound_buffer_size = 0;
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;

    let backend = std::sync::Arc::new(relay_upstream::MemoryBackend::new());
    let err = relay_gateway::run_server(config, backend).await.unwrap_err();
    assert_eq!(err.code(), "CONFIGURATION");
}

#[tokio::test]
async fn test_inflight_events_are_bounded_per_connection() {
    let mut config = relay_core::config::AppConfig::default();
    config.realtime.max_inflight_events = 1;
    let app = TestApp::with_config(config).await;
    let mut alice = app.connect("alice", &[]).await;
    settle().await;
    app.backend.set_delay(Some(Duration::from_millis(200)));

    for content in ["one", "two", "three"] {
        send(
            &mut alice,
            json!({
                "event": "sendMessage",
                "receiverId": "bob",
                "message": { "conversationId": "c1", "content": content },
            }),
        )
        .await;
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(app.engine.metrics.snapshot().events_received, 1);

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while app.backend.messages().len() < 3 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(drained.is_ok());
    assert_eq!(app.engine.metrics.snapshot().events_received, 3);
}
