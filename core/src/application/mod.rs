// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent;
pub mod ai;
pub mod chat;
pub mod error;

pub use agent::{AgentService, CreateAgentRequest, CreateConnectionRequest};
pub use ai::{AiCollaborator, ConfigAction, ConfigInterpretation, LlmAiCollaborator};
pub use chat::{AdaptPersonaRequest, ChatService, ConfigChatRequest, TestAgentRequest};
pub use error::{ServiceError, ServiceResult};
