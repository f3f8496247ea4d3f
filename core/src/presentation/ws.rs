// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! WebSocket bridge into the [`NotificationHub`].
//!
//! Frames in both directions are JSON text of the form
//! `{"event": "<name>", "data": <payload>}`. Incoming frames are dispatched
//! by a reader task; the connection's own loop forwards deliveries addressed
//! to this client. Frames that do not parse are logged and skipped.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::events::{ClientEvent, ServerEvent};
use crate::infrastructure::event_bus::{EventBusError, NotificationHub};
use crate::presentation::api::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: NotificationHub) {
    let mut subscription = hub.subscribe();
    let client_id = subscription.client_id();
    info!(%client_id, "Client connected");

    let (mut sender, mut receiver) = socket.split();

    let session = subscription.session();
    let reader_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                    Ok(event) => {
                        debug!(%client_id, event = event.name(), "Received client event");
                        reader_hub.dispatch(&session, event);
                    }
                    Err(e) => {
                        debug!(%client_id, error = %e, "Ignoring unrecognised frame");
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!(%client_id, "Client sent close frame");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(%client_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            result = subscription.recv() => {
                match result {
                    Ok(event) => {
                        if let Err(e) = send_event(&mut sender, &event).await {
                            error!(%client_id, error = %e, "Failed to send event, closing connection");
                            break;
                        }
                    }
                    Err(EventBusError::Lagged(skipped)) => {
                        let notice = ServerEvent::Error {
                            message: format!("Lagged: {} events dropped", skipped),
                        };
                        if let Err(e) = send_event(&mut sender, &notice).await {
                            error!(%client_id, error = %e, "Failed to send error event");
                            break;
                        }
                    }
                    Err(e) => {
                        info!(%client_id, error = %e, "Notification hub unavailable");
                        break;
                    }
                }
            }

            _ = &mut recv_task => {
                break;
            }
        }
    }

    recv_task.abort();
    info!(%client_id, "Client disconnected");
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(|e| {
        error!(error = %e, "Failed to serialize event");
        axum::Error::new(e)
    })?;

    sender.send(Message::Text(json.into())).await
}
