// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Edges drawn between agent nodes on the canvas.
//!
//! `source` and `target` are raw agent id strings. Nothing checks that they
//! point at live agents, and deleting an agent leaves its edges in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    Default,
    Conditional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConnection {
    pub source: String,
    pub target: String,
    pub connection_type: ConnectionType,
}

impl Connection {
    pub fn new(fields: NewConnection) -> Self {
        Self {
            id: ConnectionId::new(),
            source: fields.source,
            target: fields.target,
            connection_type: fields.connection_type,
        }
    }
}
