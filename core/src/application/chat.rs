// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Chat use cases: configuration-by-conversation, agent test turns, and
//! persona adaptation. Each one awaits the [`AiCollaborator`] once and then
//! writes its result to the store.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::agent::{parse_agent_id, present, validate_patch};
use crate::application::ai::{AgentDraft, AiCollaborator, ConfigAction};
use crate::application::error::{ServiceError, ServiceResult};
use crate::domain::agent::{Agent, AgentPatch, AgentStatus, NewAgent, Position};
use crate::domain::conversation::{ChatTurn, Conversation, ConversationId, ConversationMessage};
use crate::domain::repository::EntityStore;

/// Where agents created from the configuration chat land on the canvas.
pub const CHAT_CREATED_POSITION: Position = Position::new(400.0, 200.0);

const MODIFY_TARGET_QUESTION: &str = "Which agent would you like to modify?";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Result of one configuration-chat turn. `agent` is set for create and
/// modify; a query carries only the message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigChatOutcome {
    pub action: ConfigAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    pub message: String,
}

impl ConfigChatOutcome {
    fn query(message: impl Into<String>) -> Self {
        Self {
            action: ConfigAction::Query,
            agent: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAgentRequest {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAgentOutcome {
    pub conversation_id: ConversationId,
    pub response: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptPersonaRequest {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub new_persona: Option<String>,
}

pub struct ChatService {
    store: Arc<dyn EntityStore>,
    ai: Arc<dyn AiCollaborator>,
}

impl ChatService {
    pub fn new(store: Arc<dyn EntityStore>, ai: Arc<dyn AiCollaborator>) -> Self {
        Self { store, ai }
    }

    pub async fn config_chat(&self, request: ConfigChatRequest) -> ServiceResult<ConfigChatOutcome> {
        let Some(message) = present(request.message) else {
            return Err(ServiceError::Validation("Message is required".to_string()));
        };

        let interpretation = self
            .ai
            .interpret_config_request(&message, &request.conversation_history)
            .await?;

        match (interpretation.action, interpretation.agent) {
            (ConfigAction::Create, Some(draft)) => {
                let agent = self.store.create_agent(chat_created_agent(draft)?);
                info!(agent_id = %agent.id, name = %agent.name, "Agent created from configuration chat");
                Ok(ConfigChatOutcome {
                    action: ConfigAction::Create,
                    agent: Some(agent),
                    message: interpretation.explanation,
                })
            }
            (ConfigAction::Modify, Some(draft)) => {
                let Some(agent_id) = present(request.agent_id) else {
                    return Ok(ConfigChatOutcome::query(MODIFY_TARGET_QUESTION));
                };
                let patch = AgentPatch::from(draft);
                validate_patch(&patch).map_err(|e| ServiceError::Upstream(e.to_string()))?;
                let agent = self
                    .store
                    .update_agent(parse_agent_id(&agent_id)?, patch)
                    .ok_or_else(ServiceError::agent_not_found)?;
                info!(agent_id = %agent.id, "Agent modified from configuration chat");
                Ok(ConfigChatOutcome {
                    action: ConfigAction::Modify,
                    agent: Some(agent),
                    message: interpretation.explanation,
                })
            }
            // Deletion is never carried out from chat.
            _ => Ok(ConfigChatOutcome::query(interpretation.explanation)),
        }
    }

    pub async fn test_agent(&self, request: TestAgentRequest) -> ServiceResult<TestAgentOutcome> {
        let (Some(agent_id), Some(message)) = (present(request.agent_id), present(request.message))
        else {
            return Err(ServiceError::Validation(
                "Agent ID and message are required".to_string(),
            ));
        };

        let agent = self
            .store
            .get_agent(parse_agent_id(&agent_id)?)
            .ok_or_else(ServiceError::agent_not_found)?;

        let conversation = self.resolve_conversation(&agent_id, request.conversation_id.as_deref());

        // Snapshot taken before the new user turn is stored, so the turn is
        // sent to the collaborator once, as the trailing message.
        let history = conversation.context_window();
        self.store
            .add_message(conversation.id, ConversationMessage::user(message.clone()));

        let response = self.ai.run_agent(&agent, &message, &history).await?;

        self.store
            .add_message(conversation.id, ConversationMessage::assistant(response.clone()));

        Ok(TestAgentOutcome {
            conversation_id: conversation.id,
            response,
        })
    }

    /// An absent, malformed, or unknown conversation id starts a new
    /// conversation.
    fn resolve_conversation(&self, agent_id: &str, conversation_id: Option<&str>) -> Conversation {
        let existing = conversation_id
            .and_then(|id| ConversationId::from_string(id).ok())
            .and_then(|id| self.store.get_conversation(id));

        match existing {
            Some(conversation) => conversation,
            None => {
                if let Some(id) = conversation_id {
                    warn!(conversation_id = %id, "Unknown conversation, starting a new one");
                }
                self.store.create_conversation(agent_id)
            }
        }
    }

    pub async fn adapt_persona(&self, request: AdaptPersonaRequest) -> ServiceResult<Agent> {
        let (Some(agent_id), Some(new_persona)) =
            (present(request.agent_id), present(request.new_persona))
        else {
            return Err(ServiceError::Validation(
                "Agent ID and new persona are required".to_string(),
            ));
        };

        let agent_id = parse_agent_id(&agent_id)?;
        let agent = self
            .store
            .get_agent(agent_id)
            .ok_or_else(ServiceError::agent_not_found)?;

        let system_prompt = self
            .ai
            .adapt_persona(&agent.system_prompt, &new_persona)
            .await?;

        // The agent may have been deleted while the collaborator was working.
        let updated = self
            .store
            .update_agent(
                agent_id,
                AgentPatch {
                    persona: Some(new_persona),
                    system_prompt: Some(system_prompt),
                    ..Default::default()
                },
            )
            .ok_or_else(ServiceError::agent_not_found)?;
        info!(%agent_id, persona = %updated.persona, "Persona adapted");
        Ok(updated)
    }

    pub fn get_conversation(&self, id: &str) -> ServiceResult<Conversation> {
        let not_found = || ServiceError::NotFound("Conversation not found".to_string());
        let conversation_id = ConversationId::from_string(id).map_err(|_| not_found())?;
        self.store
            .get_conversation(conversation_id)
            .ok_or_else(not_found)
    }
}

/// A model-proposed agent must carry every required field; a partial one is
/// an unusable reply, not a reason to invent values.
fn chat_created_agent(draft: AgentDraft) -> ServiceResult<NewAgent> {
    let (Some(name), Some(persona), Some(system_prompt)) = (
        present(draft.name),
        present(draft.persona),
        present(draft.system_prompt),
    ) else {
        return Err(ServiceError::Upstream(
            "AI response is missing required agent fields".to_string(),
        ));
    };

    let mut fields = NewAgent::new(name, persona, system_prompt);
    if let Some(voice) = present(draft.voice) {
        fields.voice = voice;
    }
    fields.tools = draft.tools.unwrap_or_default();
    fields.tags = draft.tags.unwrap_or_default();
    fields.position = CHAT_CREATED_POSITION;
    fields.status = AgentStatus::Configured;
    Ok(fields)
}
