// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fan-out tests for the notification hub, driven through the same JSON
//! frames a WebSocket client sends.

use flowone_core::domain::events::{ClientEvent, ServerEvent};
use flowone_core::infrastructure::event_bus::{EventBusError, NotificationHub, Subscription};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

fn send(hub: &NotificationHub, from: &Subscription, frame: serde_json::Value) {
    let event: ClientEvent = serde_json::from_value(frame).unwrap();
    hub.dispatch(&from.session(), event);
}

#[tokio::test]
async fn test_room_relay_follows_membership() {
    let hub = NotificationHub::new(32);
    let editor = hub.subscribe();
    let mut watcher_42 = hub.subscribe();
    let mut watcher_7 = hub.subscribe();

    send(&hub, &watcher_42, json!({ "event": "join-agent", "data": 42 }));
    send(&hub, &watcher_7, json!({ "event": "join-agent", "data": "7" }));
    send(
        &hub,
        &editor,
        json!({ "event": "agent-updated", "data": { "agentId": 42, "voice": "deep" } }),
    );

    let event = assert_ok!(watcher_42.try_recv());
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({ "event": "agent-changed", "data": { "agentId": 42, "voice": "deep" } })
    );
    assert_eq!(assert_err!(watcher_7.try_recv()), EventBusError::Empty);
}

#[tokio::test]
async fn test_leave_stops_room_delivery() {
    let hub = NotificationHub::new(32);
    let editor = hub.subscribe();
    let mut watcher = hub.subscribe();

    send(&hub, &watcher, json!({ "event": "join-agent", "data": "a1" }));
    send(&hub, &watcher, json!({ "event": "leave-agent", "data": "a1" }));
    send(
        &hub,
        &editor,
        json!({ "event": "agent-updated", "data": { "agentId": "a1" } }),
    );

    assert_eq!(assert_err!(watcher.try_recv()), EventBusError::Empty);
}

#[tokio::test]
async fn test_join_after_emission_misses_event() {
    let hub = NotificationHub::new(32);
    let editor = hub.subscribe();
    let mut latecomer = hub.subscribe();

    send(
        &hub,
        &editor,
        json!({ "event": "agent-updated", "data": { "agentId": "42" } }),
    );
    send(&hub, &latecomer, json!({ "event": "join-agent", "data": "42" }));

    assert_eq!(assert_err!(latecomer.try_recv()), EventBusError::Empty);
}

#[tokio::test]
async fn test_leave_after_emission_keeps_event() {
    let hub = NotificationHub::new(32);
    let editor = hub.subscribe();
    let mut watcher = hub.subscribe();
    send(&hub, &watcher, json!({ "event": "join-agent", "data": "42" }));

    send(
        &hub,
        &editor,
        json!({ "event": "agent-updated", "data": { "agentId": "42" } }),
    );
    send(&hub, &watcher, json!({ "event": "leave-agent", "data": "42" }));

    let event = assert_ok!(watcher.try_recv());
    assert_eq!(
        event,
        ServerEvent::AgentChanged(json!({ "agentId": "42" }))
    );
}

#[tokio::test]
async fn test_voice_chunk_skips_sender() {
    let hub = NotificationHub::new(32);
    let mut speaker = hub.subscribe();
    let mut listener = hub.subscribe();
    send(&hub, &speaker, json!({ "event": "join-agent", "data": "a1" }));
    send(&hub, &listener, json!({ "event": "join-agent", "data": "a1" }));

    send(
        &hub,
        &speaker,
        json!({ "event": "voice-chunk", "data": { "agentId": "a1", "chunk": "AAEC" } }),
    );

    let event = listener.recv().await.unwrap();
    assert_eq!(event.name(), "voice-response");
    assert_eq!(assert_err!(speaker.try_recv()), EventBusError::Empty);
}

#[tokio::test]
async fn test_lifecycle_events_reach_everyone() {
    let hub = NotificationHub::new(32);
    let creator = hub.subscribe();
    let mut in_no_room = hub.subscribe();

    for (incoming, outgoing) in [
        ("agent-created", "agent-created"),
        ("agent-deleted", "agent-deleted"),
        ("persona-changed", "persona-changed"),
    ] {
        send(&hub, &creator, json!({ "event": incoming, "data": { "agentId": "x" } }));
        let event = in_no_room.recv().await.unwrap();
        assert_eq!(event.name(), outgoing);
    }
}

#[tokio::test]
async fn test_events_are_not_replayed_to_late_subscribers() {
    let hub = NotificationHub::new(32);
    let early = hub.subscribe();
    send(&hub, &early, json!({ "event": "agent-created", "data": { "name": "A" } }));

    let mut late = hub.subscribe();
    assert_eq!(assert_err!(late.try_recv()), EventBusError::Empty);
}

#[test]
fn test_lag_notice_wire_format() {
    let notice = ServerEvent::Error {
        message: "Lagged: 3 events dropped".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&notice).unwrap(),
        json!({ "event": "error", "data": { "message": "Lagged: 3 events dropped" } })
    );
}
