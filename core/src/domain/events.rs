// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Real-time canvas events exchanged over the WebSocket channel.
//!
//! Clients emit [`ClientEvent`]s; the hub answers with [`ServerEvent`]s
//! addressed by a [`FanoutScope`]. Payloads other than room ids are opaque
//! JSON and are relayed untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identity of one connected WebSocket client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Room name for an agent's channel.
pub fn agent_room(agent_id: &str) -> String {
    format!("agent-{}", agent_id)
}

/// Pull `agentId` out of a relay payload. Numbers are accepted as well as
/// strings since the canvas does not constrain the type.
pub fn payload_agent_id(payload: &Value) -> Option<String> {
    match payload.get("agentId")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinAgent(RoomKey),
    LeaveAgent(RoomKey),
    AgentUpdated(Value),
    AgentCreated(Value),
    AgentDeleted(Value),
    VoiceChunk(Value),
    PersonaChanged(Value),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinAgent(_) => "join-agent",
            ClientEvent::LeaveAgent(_) => "leave-agent",
            ClientEvent::AgentUpdated(_) => "agent-updated",
            ClientEvent::AgentCreated(_) => "agent-created",
            ClientEvent::AgentDeleted(_) => "agent-deleted",
            ClientEvent::VoiceChunk(_) => "voice-chunk",
            ClientEvent::PersonaChanged(_) => "persona-changed",
        }
    }
}

/// Agent id carried by join/leave, as a string or a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomKey {
    Text(String),
    Number(i64),
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKey::Text(s) => f.write_str(s),
            RoomKey::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    AgentCreated(Value),
    AgentChanged(Value),
    AgentDeleted(Value),
    PersonaChanged(Value),
    VoiceResponse(Value),
    /// Sent to a lagging client after it missed events.
    Error { message: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::AgentCreated(_) => "agent-created",
            ServerEvent::AgentChanged(_) => "agent-changed",
            ServerEvent::AgentDeleted(_) => "agent-deleted",
            ServerEvent::PersonaChanged(_) => "persona-changed",
            ServerEvent::VoiceResponse(_) => "voice-response",
            ServerEvent::Error { .. } => "error",
        }
    }
}

/// Who receives a published event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanoutScope {
    /// Every connected client
    Everyone,
    /// Clients joined to the room
    Room(String),
    /// Clients joined to the room, minus the one that sent it
    RoomExcept { room: String, sender: ClientId },
}
