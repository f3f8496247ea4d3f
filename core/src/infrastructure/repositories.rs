// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory Entity Store
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Process-lifetime storage for agents, connections and
//!   conversations
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! Nothing is persisted: a restart discards all state. Each map is an
//! insertion-ordered `IndexMap` behind its own lock, and every trait method
//! takes the lock exactly once so operations never interleave mid-way.

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::agent::{Agent, AgentId, AgentPatch, NewAgent};
use crate::domain::connection::{Connection, ConnectionId, NewConnection};
use crate::domain::conversation::{Conversation, ConversationId, ConversationMessage};
use crate::domain::repository::EntityStore;

#[derive(Default)]
pub struct InMemoryEntityStore {
    agents: RwLock<IndexMap<AgentId, Agent>>,
    connections: RwLock<IndexMap<ConnectionId, Connection>>,
    conversations: RwLock<IndexMap<ConversationId, Conversation>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for InMemoryEntityStore {
    fn create_agent(&self, fields: NewAgent) -> Agent {
        let mut agents = self.agents.write();
        let mut agent = Agent::new(fields);
        // v4 collisions are not a practical concern, but ids must never repeat.
        while agents.contains_key(&agent.id) {
            agent.id = AgentId::new();
        }
        agents.insert(agent.id, agent.clone());
        agent
    }

    fn get_agent(&self, id: AgentId) -> Option<Agent> {
        self.agents.read().get(&id).cloned()
    }

    fn get_all_agents(&self) -> Vec<Agent> {
        self.agents.read().values().cloned().collect()
    }

    fn update_agent(&self, id: AgentId, patch: AgentPatch) -> Option<Agent> {
        let mut agents = self.agents.write();
        let agent = agents.get_mut(&id)?;
        agent.apply_patch(patch);
        Some(agent.clone())
    }

    fn delete_agent(&self, id: AgentId) -> bool {
        self.agents.write().shift_remove(&id).is_some()
    }

    fn create_connection(&self, fields: NewConnection) -> Connection {
        let mut connections = self.connections.write();
        let mut connection = Connection::new(fields);
        while connections.contains_key(&connection.id) {
            connection.id = ConnectionId::new();
        }
        connections.insert(connection.id, connection.clone());
        connection
    }

    fn get_connections(&self) -> Vec<Connection> {
        self.connections.read().values().cloned().collect()
    }

    fn delete_connection(&self, id: ConnectionId) -> bool {
        self.connections.write().shift_remove(&id).is_some()
    }

    fn create_conversation(&self, agent_id: &str) -> Conversation {
        let mut conversations = self.conversations.write();
        let mut conversation = Conversation::new(agent_id);
        while conversations.contains_key(&conversation.id) {
            conversation.id = ConversationId::new();
        }
        conversations.insert(conversation.id, conversation.clone());
        conversation
    }

    fn get_conversation(&self, id: ConversationId) -> Option<Conversation> {
        self.conversations.read().get(&id).cloned()
    }

    fn get_agent_conversations(&self, agent_id: &str) -> Vec<Conversation> {
        self.conversations
            .read()
            .values()
            .filter(|c| c.agent_id == agent_id)
            .cloned()
            .collect()
    }

    fn add_message(&self, conversation_id: ConversationId, message: ConversationMessage) {
        match self.conversations.write().get_mut(&conversation_id) {
            Some(conversation) => conversation.push(message),
            None => debug!(%conversation_id, "Dropping message for unknown conversation"),
        }
    }
}
