// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for the `/ws` bridge over a real socket.

use async_trait::async_trait;
use flowone_core::application::ai::{AiCollaborator, ConfigInterpretation};
use flowone_core::application::error::{ServiceError, ServiceResult};
use flowone_core::domain::agent::Agent;
use flowone_core::domain::config::ServerConfig;
use flowone_core::domain::conversation::ChatTurn;
use flowone_core::domain::events::{FanoutScope, ServerEvent};
use flowone_core::infrastructure::event_bus::NotificationHub;
use flowone_core::infrastructure::repositories::InMemoryEntityStore;
use flowone_core::presentation::api::{app, AppState};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Offline;

#[async_trait]
impl AiCollaborator for Offline {
    async fn interpret_config_request(
        &self,
        _user_message: &str,
        _history: &[ChatTurn],
    ) -> ServiceResult<ConfigInterpretation> {
        Err(ServiceError::Upstream("offline".to_string()))
    }

    async fn run_agent(
        &self,
        _agent: &Agent,
        _user_message: &str,
        _history: &[ChatTurn],
    ) -> ServiceResult<String> {
        Err(ServiceError::Upstream("offline".to_string()))
    }

    async fn adapt_persona(&self, _current_prompt: &str, _new_persona: &str) -> ServiceResult<String> {
        Err(ServiceError::Upstream("offline".to_string()))
    }
}

async fn serve(hub: NotificationHub) -> SocketAddr {
    let state = AppState::new(Arc::new(InMemoryEntityStore::new()), Arc::new(Offline), hub);
    let router = app(Arc::new(state), &ServerConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    socket
}

async fn send(socket: &mut Client, frame: Value) {
    socket.send(Message::text(frame.to_string())).await.unwrap();
}

/// Next JSON text frame, failing the test after two seconds of silence
async fn next_frame(socket: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip frames until one with the given event name arrives
async fn wait_for(socket: &mut Client, event: &str, data: Value) -> Value {
    loop {
        let frame = next_frame(socket).await;
        if frame["event"] == event && frame["data"] == data {
            return frame;
        }
    }
}

/// Round-trip a broadcast marker so every frame sent before it has been
/// dispatched by the server.
async fn sync(socket: &mut Client, marker: &str) {
    let data = json!({ "marker": marker });
    send(socket, json!({ "event": "agent-created", "data": data.clone() })).await;
    wait_for(socket, "agent-created", data).await;
}

#[tokio::test]
async fn test_bad_frames_do_not_close_socket() {
    let addr = serve(NotificationHub::new(32)).await;
    let mut watcher = connect(addr).await;
    let mut editor = connect(addr).await;

    watcher.send(Message::text("not json at all")).await.unwrap();
    send(&mut watcher, json!({ "event": "no-such-event", "data": {} })).await;
    send(&mut watcher, json!({ "event": "join-agent", "data": "42" })).await;
    sync(&mut watcher, "watcher").await;
    sync(&mut editor, "editor").await;

    send(
        &mut editor,
        json!({ "event": "agent-updated", "data": { "agentId": "42", "voice": "deep" } }),
    )
    .await;

    let frame = wait_for(
        &mut watcher,
        "agent-changed",
        json!({ "agentId": "42", "voice": "deep" }),
    )
    .await;
    assert_eq!(frame["event"], "agent-changed");
}

#[tokio::test]
async fn test_voice_chunk_reaches_peer_only() {
    let addr = serve(NotificationHub::new(32)).await;
    let mut speaker = connect(addr).await;
    let mut listener = connect(addr).await;

    send(&mut speaker, json!({ "event": "join-agent", "data": "9" })).await;
    send(&mut listener, json!({ "event": "join-agent", "data": "9" })).await;
    sync(&mut speaker, "speaker").await;
    sync(&mut listener, "listener").await;

    send(
        &mut speaker,
        json!({ "event": "voice-chunk", "data": { "agentId": "9", "chunk": "AAEC" } }),
    )
    .await;
    wait_for(
        &mut listener,
        "voice-response",
        json!({ "agentId": "9", "chunk": "AAEC" }),
    )
    .await;

    // An echo would be queued ahead of the speaker's next marker.
    let marker = json!({ "marker": "after" });
    send(&mut speaker, json!({ "event": "agent-created", "data": marker.clone() })).await;
    loop {
        let frame = next_frame(&mut speaker).await;
        assert_ne!(frame["event"], "voice-response");
        if frame["data"] == marker {
            break;
        }
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_lagging_client_gets_error_notice() {
    let hub = NotificationHub::new(2);
    let addr = serve(hub.clone()).await;
    let mut slow = connect(addr).await;
    sync(&mut slow, "ready").await;

    // No await between publishes, so the socket task cannot drain in between.
    for n in 0..6 {
        hub.publish(
            FanoutScope::Everyone,
            ServerEvent::AgentCreated(json!({ "n": n })),
        );
    }

    assert_eq!(
        next_frame(&mut slow).await,
        json!({ "event": "error", "data": { "message": "Lagged: 4 events dropped" } })
    );
    assert_eq!(
        next_frame(&mut slow).await,
        json!({ "event": "agent-created", "data": { "n": 4 } })
    );
}
