// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent and connection use cases: presence validation, defaults, and
//! translation of raw ids into store lookups.

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::application::error::{ServiceError, ServiceResult};
use crate::domain::agent::{Agent, AgentId, AgentPatch, AgentStatus, NewAgent, Position};
use crate::domain::connection::{Connection, ConnectionId, ConnectionType, NewConnection};
use crate::domain::conversation::Conversation;
use crate::domain::repository::EntityStore;

/// Body of `POST /agents`. Empty strings count as missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub status: Option<AgentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateConnectionRequest {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, rename = "type")]
    pub connection_type: Option<ConnectionType>,
}

/// `Some` only for a non-blank string.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_agent_id(id: &str) -> ServiceResult<AgentId> {
    // A malformed id can never match a stored agent.
    AgentId::from_string(id).map_err(|_| ServiceError::agent_not_found())
}

/// Reject patches that would blank out a required field.
pub fn validate_patch(patch: &AgentPatch) -> ServiceResult<()> {
    let required = [
        ("name", &patch.name),
        ("persona", &patch.persona),
        ("systemPrompt", &patch.system_prompt),
    ];
    for (field, value) in required {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(ServiceError::Validation(format!("{} must not be empty", field)));
        }
    }
    Ok(())
}

pub struct AgentService {
    store: Arc<dyn EntityStore>,
}

impl AgentService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn list_agents(&self) -> Vec<Agent> {
        self.store.get_all_agents()
    }

    pub fn get_agent(&self, id: &str) -> ServiceResult<Agent> {
        self.store
            .get_agent(parse_agent_id(id)?)
            .ok_or_else(ServiceError::agent_not_found)
    }

    pub fn create_agent(&self, request: CreateAgentRequest) -> ServiceResult<Agent> {
        let (Some(name), Some(persona), Some(system_prompt)) = (
            present(request.name),
            present(request.persona),
            present(request.system_prompt),
        ) else {
            return Err(ServiceError::Validation("Missing required fields".to_string()));
        };

        let mut fields = NewAgent::new(name, persona, system_prompt);
        if let Some(voice) = present(request.voice) {
            fields.voice = voice;
        }
        if let Some(tools) = request.tools {
            fields.tools = tools;
        }
        if let Some(tags) = request.tags {
            fields.tags = tags;
        }
        if let Some(position) = request.position {
            fields.position = position;
        }
        if let Some(status) = request.status {
            fields.status = status;
        }

        let agent = self.store.create_agent(fields);
        info!(agent_id = %agent.id, name = %agent.name, "Agent created");
        Ok(agent)
    }

    /// Fails with NotFound before looking at the patch, so an unknown id
    /// always reports 404 whatever the body holds.
    pub fn ensure_agent_exists(&self, id: &str) -> ServiceResult<AgentId> {
        let agent_id = parse_agent_id(id)?;
        match self.store.get_agent(agent_id) {
            Some(_) => Ok(agent_id),
            None => Err(ServiceError::agent_not_found()),
        }
    }

    pub fn update_agent(&self, id: &str, patch: AgentPatch) -> ServiceResult<Agent> {
        let agent_id = parse_agent_id(id)?;
        validate_patch(&patch)?;
        let agent = self
            .store
            .update_agent(agent_id, patch)
            .ok_or_else(ServiceError::agent_not_found)?;
        info!(agent_id = %agent.id, "Agent updated");
        Ok(agent)
    }

    /// Connections and conversations that reference the agent are left alone.
    pub fn delete_agent(&self, id: &str) -> ServiceResult<()> {
        let agent_id = parse_agent_id(id)?;
        if !self.store.delete_agent(agent_id) {
            return Err(ServiceError::agent_not_found());
        }
        info!(%agent_id, "Agent deleted");
        Ok(())
    }

    pub fn agent_conversations(&self, id: &str) -> Vec<Conversation> {
        self.store.get_agent_conversations(id)
    }

    pub fn list_connections(&self) -> Vec<Connection> {
        self.store.get_connections()
    }

    /// No check that source or target name existing agents.
    pub fn create_connection(&self, request: CreateConnectionRequest) -> ServiceResult<Connection> {
        let (Some(source), Some(target)) = (present(request.source), present(request.target))
        else {
            return Err(ServiceError::Validation("Missing source or target".to_string()));
        };

        let connection = self.store.create_connection(NewConnection {
            source,
            target,
            connection_type: request.connection_type.unwrap_or_default(),
        });
        info!(connection_id = %connection.id, "Connection created");
        Ok(connection)
    }

    pub fn delete_connection(&self, id: &str) -> ServiceResult<()> {
        let not_found = || ServiceError::NotFound("Connection not found".to_string());
        let connection_id = ConnectionId::from_string(id).map_err(|_| not_found())?;
        if !self.store.delete_connection(connection_id) {
            return Err(not_found());
        }
        Ok(())
    }
}
