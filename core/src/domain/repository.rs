// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Entity Store Interface
//!
//! Storage contract for the three entity kinds the studio tracks. The trait
//! lives in the domain layer and is implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Entity | Operations |
//! |--------|------------|
//! | `Agent` | create, get, list, update (patch), delete |
//! | `Connection` | create, list, delete |
//! | `Conversation` | create, get, list by agent, append message |
//!
//! Every operation is synchronous and atomic on its own. Two writers racing
//! on one id resolve last-write-wins; there is no version check.
//!
//! Referential integrity is not enforced: connections and
//! conversations may name agents that never existed or were deleted, and
//! agent deletion does not cascade.

use crate::domain::agent::{Agent, AgentId, AgentPatch, NewAgent};
use crate::domain::connection::{Connection, ConnectionId, NewConnection};
use crate::domain::conversation::{Conversation, ConversationId, ConversationMessage};

pub trait EntityStore: Send + Sync {
    /// Store a new agent under a freshly generated id.
    fn create_agent(&self, fields: NewAgent) -> Agent;

    fn get_agent(&self, id: AgentId) -> Option<Agent>;

    /// All agents in insertion order.
    fn get_all_agents(&self) -> Vec<Agent>;

    /// Merge `patch` over the stored agent. `None` when the id is unknown;
    /// no record is created in that case.
    fn update_agent(&self, id: AgentId, patch: AgentPatch) -> Option<Agent>;

    /// `true` when a record existed and was removed.
    fn delete_agent(&self, id: AgentId) -> bool;

    fn create_connection(&self, fields: NewConnection) -> Connection;

    fn get_connections(&self) -> Vec<Connection>;

    fn delete_connection(&self, id: ConnectionId) -> bool;

    fn create_conversation(&self, agent_id: &str) -> Conversation;

    fn get_conversation(&self, id: ConversationId) -> Option<Conversation>;

    fn get_agent_conversations(&self, agent_id: &str) -> Vec<Conversation>;

    /// Append to an existing conversation. Unknown ids are silently ignored.
    fn add_message(&self, conversation_id: ConversationId, message: ConversationMessage);
}
