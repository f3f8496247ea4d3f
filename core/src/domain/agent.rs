// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle label shown on the canvas node.
///
/// No transition rules are enforced: any status may replace any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    New,
    #[default]
    Configured,
    Testing,
    Error,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentStatus::New => "new",
            AgentStatus::Configured => "configured",
            AgentStatus::Testing => "testing",
            AgentStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Canvas coordinate. Only the UI interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Position {
    fn default() -> Self {
        DEFAULT_POSITION
    }
}

pub const DEFAULT_VOICE: &str = "neutral";
pub const DEFAULT_POSITION: Position = Position::new(250.0, 100.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub persona: String,
    pub system_prompt: String,
    pub voice: String,
    pub tools: Vec<String>,
    pub tags: Vec<String>,
    pub position: Position,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully resolved fields for a new agent. Defaults have already been applied
/// by the caller; the store only stamps identity and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAgent {
    pub name: String,
    pub persona: String,
    pub system_prompt: String,
    pub voice: String,
    pub tools: Vec<String>,
    pub tags: Vec<String>,
    pub position: Position,
    pub status: AgentStatus,
}

impl NewAgent {
    /// Required fields with every optional field at its default.
    pub fn new(
        name: impl Into<String>,
        persona: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            persona: persona.into(),
            system_prompt: system_prompt.into(),
            voice: DEFAULT_VOICE.to_string(),
            tools: Vec::new(),
            tags: Vec::new(),
            position: DEFAULT_POSITION,
            status: AgentStatus::Configured,
        }
    }
}

/// Shallow patch over the mutable agent fields.
///
/// Identity and timestamps have no slot here, so a patch can never rewrite
/// `id` or `createdAt`. Unknown keys in incoming JSON are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
}

impl AgentPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Agent {
    pub fn new(fields: NewAgent) -> Self {
        let now = Utc::now();
        Self {
            id: AgentId::new(),
            name: fields.name,
            persona: fields.persona,
            system_prompt: fields.system_prompt,
            voice: fields.voice,
            tools: fields.tools,
            tags: fields.tags,
            position: fields.position,
            status: fields.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite each field present in the patch and refresh `updated_at`.
    pub fn apply_patch(&mut self, patch: AgentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(persona) = patch.persona {
            self.persona = persona;
        }
        if let Some(system_prompt) = patch.system_prompt {
            self.system_prompt = system_prompt;
        }
        if let Some(voice) = patch.voice {
            self.voice = voice;
        }
        if let Some(tools) = patch.tools {
            self.tools = tools;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}
