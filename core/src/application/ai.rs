// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AI Collaborator
//!
//! The three prompt-driven operations the studio needs from a hosted model:
//! interpreting configuration requests, role-playing a configured agent, and
//! rewriting a system prompt for a new persona.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Prompt construction and reply post-processing on top of
//!   any [`LLMProvider`]
//!
//! Calls are never retried and carry no in-process timeout; a provider
//! failure surfaces immediately as [`ServiceError::Upstream`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::application::error::{ServiceError, ServiceResult};
use crate::domain::agent::{Agent, AgentPatch};
use crate::domain::config::TokenLimits;
use crate::domain::conversation::ChatTurn;
use crate::domain::llm::{GenerationOptions, GenerationRequest, LLMProvider};

#[async_trait]
pub trait AiCollaborator: Send + Sync {
    /// Turn a natural-language request into a structured configuration action
    async fn interpret_config_request(
        &self,
        user_message: &str,
        history: &[ChatTurn],
    ) -> ServiceResult<ConfigInterpretation>;

    /// Answer `user_message` in character as `agent`
    async fn run_agent(
        &self,
        agent: &Agent,
        user_message: &str,
        history: &[ChatTurn],
    ) -> ServiceResult<String>;

    /// Rewrite `current_prompt` to embody `new_persona`
    async fn adapt_persona(&self, current_prompt: &str, new_persona: &str) -> ServiceResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigAction {
    Create,
    Modify,
    Delete,
    Query,
}

/// Agent fields proposed by the model. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
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
}

impl From<AgentDraft> for AgentPatch {
    fn from(draft: AgentDraft) -> Self {
        AgentPatch {
            name: draft.name,
            persona: draft.persona,
            system_prompt: draft.system_prompt,
            voice: draft.voice,
            tools: draft.tools,
            tags: draft.tags,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigInterpretation {
    pub action: ConfigAction,
    #[serde(default)]
    pub agent: Option<AgentDraft>,
    #[serde(default)]
    pub explanation: String,
}

const CONFIG_ASSISTANT_PROMPT: &str = r#"You are the configuration assistant of FlowOne Voice, a canvas for building voice AI agents.
Read the user's request to create, change or remove an agent and reply with JSON only.

From a description of an agent, derive:
- name: a short descriptive name
- persona: personality traits (e.g. friendly, formal, playful, technical)
- systemPrompt: a complete system prompt the agent will run with
- voice: how the agent should sound (e.g. warm, brisk, calm, authoritative)
- tools: tool names the user mentions (search, calculator, calendar, ...)
- tags: a few categorisation labels

Reply with exactly one JSON object of this shape:
{
  "action": "create" | "modify" | "delete" | "query",
  "agent": {
    "name": "string",
    "persona": "string",
    "systemPrompt": "string",
    "voice": "string",
    "tools": ["string"],
    "tags": ["string"]
  },
  "explanation": "one or two sentences on what you understood"
}

When the request is ambiguous, use "query" and put your clarifying question in "explanation".

Example
User: "I want a patient chemistry tutor for high-school students"
Reply: {
  "action": "create",
  "agent": {
    "name": "Chemistry Tutor",
    "persona": "patient, encouraging, clear",
    "systemPrompt": "You are a patient chemistry tutor for high-school students. Explain ideas step by step, check understanding with short questions and praise progress.",
    "voice": "warm, steady",
    "tools": ["calculator"],
    "tags": ["education", "chemistry"]
  },
  "explanation": "Creating a patient chemistry tutor for high-school students."
}"#;

fn persona_rewrite_prompt(current_prompt: &str, new_persona: &str) -> String {
    format!(
        "Here is an assistant's system prompt:\n\"{}\"\n\n\
         Rewrite it so the assistant embodies this persona: \"{}\".\n\
         Keep what the assistant does; change only its tone, style and approach.\n\n\
         Reply with the new system prompt and nothing else.",
        current_prompt, new_persona
    )
}

/// Slice from the first `{` to the last `}`, if the text has both in order.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into a [`ConfigInterpretation`]; no object or a
/// malformed one is an upstream failure, never a silent default.
pub fn parse_interpretation(text: &str) -> ServiceResult<ConfigInterpretation> {
    let json = extract_json_object(text)
        .ok_or_else(|| ServiceError::Upstream("Failed to parse AI response".to_string()))?;
    Ok(serde_json::from_str(json)?)
}

/// [`AiCollaborator`] backed by an [`LLMProvider`]
pub struct LlmAiCollaborator {
    provider: Arc<dyn LLMProvider>,
    limits: TokenLimits,
}

impl LlmAiCollaborator {
    pub fn new(provider: Arc<dyn LLMProvider>, limits: TokenLimits) -> Self {
        Self { provider, limits }
    }

    async fn complete(
        &self,
        operation: &'static str,
        system: Option<String>,
        messages: Vec<ChatTurn>,
        max_tokens: u32,
    ) -> ServiceResult<String> {
        let request = GenerationRequest::new(system, messages);
        let options = GenerationOptions::with_max_tokens(max_tokens);

        match self.provider.generate(&request, &options).await {
            Ok(response) => {
                debug!(
                    operation,
                    model = %response.model,
                    total_tokens = response.usage.total_tokens,
                    "AI collaborator call completed"
                );
                Ok(response.text)
            }
            Err(e) => {
                error!(operation, error = %e, "AI collaborator call failed");
                Err(e.into())
            }
        }
    }
}

fn with_user_turn(history: &[ChatTurn], user_message: &str) -> Vec<ChatTurn> {
    let mut messages = history.to_vec();
    messages.push(ChatTurn::user(user_message));
    messages
}

#[async_trait]
impl AiCollaborator for LlmAiCollaborator {
    async fn interpret_config_request(
        &self,
        user_message: &str,
        history: &[ChatTurn],
    ) -> ServiceResult<ConfigInterpretation> {
        let text = self
            .complete(
                "interpret_config_request",
                Some(CONFIG_ASSISTANT_PROMPT.to_string()),
                with_user_turn(history, user_message),
                self.limits.interpret,
            )
            .await?;
        parse_interpretation(&text)
    }

    async fn run_agent(
        &self,
        agent: &Agent,
        user_message: &str,
        history: &[ChatTurn],
    ) -> ServiceResult<String> {
        self.complete(
            "run_agent",
            Some(agent.system_prompt.clone()),
            with_user_turn(history, user_message),
            self.limits.run,
        )
        .await
    }

    async fn adapt_persona(&self, current_prompt: &str, new_persona: &str) -> ServiceResult<String> {
        let text = self
            .complete(
                "adapt_persona",
                None,
                vec![ChatTurn::user(persona_rewrite_prompt(current_prompt, new_persona))],
                self.limits.adapt,
            )
            .await?;

        if text.trim().is_empty() {
            return Ok(current_prompt.to_string());
        }
        Ok(text)
    }
}
