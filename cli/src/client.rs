// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for a running studio server

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use flowone_core::domain::agent::Agent;

/// Body of `POST /api/agents`. Empty tag and tool lists are left for the
/// server to default.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgentRequest {
    pub name: String,
    pub persona: String,
    pub system_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StudioClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl StudioClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        Self::with_base_url(format!("http://{}:{}", host, port))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `true` when `/health` answers with a success status
    pub async fn health(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn list_agents(&self) -> Result<Vec<Agent>> {
        #[derive(Deserialize)]
        struct AgentsResponse {
            agents: Vec<Agent>,
        }

        let response = self
            .client
            .get(format!("{}/api/agents", self.base_url))
            .send()
            .await
            .context("Failed to list agents")?;

        let body: AgentsResponse = parse(response, "Failed to list agents").await?;
        Ok(body.agents)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        let response = self
            .client
            .get(format!("{}/api/agents/{}", self.base_url, agent_id))
            .send()
            .await
            .context("Failed to get agent")?;

        let body: AgentResponse = parse(response, "Failed to get agent").await?;
        Ok(body.agent)
    }

    pub async fn create_agent(&self, request: &NewAgentRequest) -> Result<Agent> {
        let response = self
            .client
            .post(format!("{}/api/agents", self.base_url))
            .json(request)
            .send()
            .await
            .context("Failed to create agent")?;

        let body: AgentResponse = parse(response, "Failed to create agent").await?;
        Ok(body.agent)
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/api/agents/{}", self.base_url, agent_id))
            .send()
            .await
            .context("Failed to delete agent")?;

        let _: Value = parse(response, "Failed to delete agent").await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct AgentResponse {
    agent: Agent,
}

/// Decode a success body, or turn the `{error}` envelope into an error
async fn parse<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        anyhow::bail!("{}: {} ({})", action, message, status);
    }

    response
        .json()
        .await
        .with_context(|| format!("{}: unexpected response body", action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent_json(name: &str) -> Value {
        json!({
            "id": "6f1c2a8e-6a55-4a0e-9a8f-0d8b7c1e2f30",
            "name": name,
            "persona": "calm",
            "systemPrompt": "Help.",
            "voice": "neutral",
            "tools": [],
            "tags": [],
            "position": { "x": 250.0, "y": 100.0 },
            "status": "configured",
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_list_agents() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/agents")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "success": true, "agents": [agent_json("Tutor")] }).to_string())
            .create_async()
            .await;

        let client = StudioClient::with_base_url(server.url()).unwrap();
        let agents = client.list_agents().await.unwrap();

        mock.assert_async().await;
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].name, "Tutor");
    }

    #[tokio::test]
    async fn test_error_envelope_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/agents/missing")
            .with_status(404)
            .with_body(r#"{"error":"Agent not found"}"#)
            .create_async()
            .await;

        let client = StudioClient::with_base_url(server.url()).unwrap();
        let err = client.get_agent("missing").await.unwrap_err();
        assert!(err.to_string().contains("Agent not found"));
    }

    #[tokio::test]
    async fn test_create_agent_sends_camel_case() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/agents")
            .match_body(mockito::Matcher::PartialJson(json!({
                "name": "Tutor",
                "systemPrompt": "Help.",
                "voice": "warm"
            })))
            .with_status(200)
            .with_body(json!({ "success": true, "agent": agent_json("Tutor") }).to_string())
            .create_async()
            .await;

        let client = StudioClient::with_base_url(server.url()).unwrap();
        let request = NewAgentRequest {
            name: "Tutor".to_string(),
            persona: "calm".to_string(),
            system_prompt: "Help.".to_string(),
            voice: Some("warm".to_string()),
            ..Default::default()
        };
        let agent = client.create_agent(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(agent.persona, "calm");
    }

    #[tokio::test]
    async fn test_health_unreachable() {
        let client = StudioClient::with_base_url("http://127.0.0.1:1").unwrap();
        assert!(!client.health().await);
    }
}
