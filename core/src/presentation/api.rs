// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! REST routes for agents, connections and chat, plus the WebSocket
//! upgrade into the notification hub. Successful responses are wrapped as
//! `{"success": true, ...}`; failures use [`ApiError`].
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** Translate HTTP requests into application service calls

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::agent::{AgentService, CreateAgentRequest, CreateConnectionRequest};
use crate::application::ai::AiCollaborator;
use crate::application::chat::{
    AdaptPersonaRequest, ChatService, ConfigChatRequest, TestAgentRequest,
};
use crate::domain::agent::AgentPatch;
use crate::domain::config::ServerConfig;
use crate::domain::repository::EntityStore;
use crate::infrastructure::event_bus::NotificationHub;
use crate::presentation::error::{ApiError, ApiJson, ApiResult};
use crate::presentation::ws::ws_handler;

pub struct AppState {
    pub agents: AgentService,
    pub chat: ChatService,
    pub hub: NotificationHub,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EntityStore>,
        ai: Arc<dyn AiCollaborator>,
        hub: NotificationHub,
    ) -> Self {
        Self {
            agents: AgentService::new(store.clone()),
            chat: ChatService::new(store, ai),
            hub,
        }
    }
}

pub fn app(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let agents = Router::new()
        .route("/", get(list_agents).post(create_agent))
        .route("/connections", post(create_connection))
        .route("/connections/all", get(list_connections))
        .route("/connections/{id}", delete(delete_connection))
        .route("/{id}", get(get_agent).patch(update_agent).delete(delete_agent))
        .route("/{id}/conversations", get(agent_conversations));

    let chat = Router::new()
        .route("/config", post(config_chat))
        .route("/test", post(test_agent))
        .route("/adapt-persona", post(adapt_persona))
        .route("/conversations/{id}", get(get_conversation));

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .nest("/api/agents", agents)
        .nest("/api/chat", chat)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&server.frontend_url))
        .with_state(state)
}

fn build_cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => {
            info!(origin = %frontend_url, "CORS: allowing frontend origin");
            cors.allow_origin(origin)
        }
        Err(_) => {
            warn!(origin = %frontend_url, "CORS: frontend URL is not a valid origin, allowing all origins");
            cors.allow_origin(Any)
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now() }))
}

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}

async fn list_agents(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "success": true, "agents": state.agents.list_agents() }))
}

async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let agent = state
        .agents
        .get_agent(&id)
        .map_err(ApiError::service("Failed to get agent"))?;
    Ok(Json(json!({ "success": true, "agent": agent })))
}

async fn create_agent(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateAgentRequest>,
) -> ApiResult<Json<Value>> {
    let agent = state
        .agents
        .create_agent(request)
        .map_err(ApiError::service("Failed to create agent"))?;
    Ok(Json(json!({ "success": true, "agent": agent })))
}

/// The body is read raw so an unknown id answers 404 before the patch is
/// parsed. An empty body is an empty patch.
async fn update_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let map_err = ApiError::service("Failed to update agent");
    state.agents.ensure_agent_exists(&id).map_err(&map_err)?;

    let patch: AgentPatch = if body.iter().all(u8::is_ascii_whitespace) {
        AgentPatch::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let agent = state.agents.update_agent(&id, patch).map_err(&map_err)?;
    Ok(Json(json!({ "success": true, "agent": agent })))
}

async fn delete_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .agents
        .delete_agent(&id)
        .map_err(ApiError::service("Failed to delete agent"))?;
    Ok(Json(json!({ "success": true, "message": "Agent deleted" })))
}

async fn agent_conversations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<Value> {
    Json(json!({ "success": true, "conversations": state.agents.agent_conversations(&id) }))
}

async fn list_connections(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "success": true, "connections": state.agents.list_connections() }))
}

async fn create_connection(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateConnectionRequest>,
) -> ApiResult<Json<Value>> {
    let connection = state
        .agents
        .create_connection(request)
        .map_err(ApiError::service("Failed to create connection"))?;
    Ok(Json(json!({ "success": true, "connection": connection })))
}

async fn delete_connection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state
        .agents
        .delete_connection(&id)
        .map_err(ApiError::service("Failed to delete connection"))?;
    Ok(Json(json!({ "success": true })))
}

async fn config_chat(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ConfigChatRequest>,
) -> ApiResult<Json<Value>> {
    let outcome = state
        .chat
        .config_chat(request)
        .await
        .map_err(ApiError::service("Failed to process configuration request"))?;

    let mut body = json!({ "success": true, "action": outcome.action, "message": outcome.message });
    if let Some(agent) = outcome.agent {
        body["agent"] = json!(agent);
    }
    Ok(Json(body))
}

async fn test_agent(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<TestAgentRequest>,
) -> ApiResult<Json<Value>> {
    let outcome = state
        .chat
        .test_agent(request)
        .await
        .map_err(ApiError::service("Failed to test agent"))?;
    Ok(Json(json!({
        "success": true,
        "conversationId": outcome.conversation_id,
        "response": outcome.response,
    })))
}

async fn adapt_persona(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<AdaptPersonaRequest>,
) -> ApiResult<Json<Value>> {
    let agent = state
        .chat
        .adapt_persona(request)
        .await
        .map_err(ApiError::service("Failed to adapt persona"))?;
    Ok(Json(json!({ "success": true, "agent": agent })))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let conversation = state
        .chat
        .get_conversation(&id)
        .map_err(ApiError::service("Failed to get conversation"))?;
    Ok(Json(json!({ "success": true, "conversation": conversation })))
}
