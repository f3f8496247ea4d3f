// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Studio HTTP/WebSocket server

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use flowone_core::{
    application::ai::{AiCollaborator, LlmAiCollaborator},
    domain::{config::StudioConfigManifest, repository::EntityStore},
    infrastructure::{
        event_bus::NotificationHub, llm::create_provider, repositories::InMemoryEntityStore,
    },
    presentation::api::{app, AppState},
};

/// Wire the store, hub and AI collaborator together and serve until a
/// shutdown signal arrives. All state is dropped on exit.
pub async fn start_server(config: StudioConfigManifest) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let provider = create_provider(&config.spec.llm).context("Failed to initialize LLM provider")?;
    let ai: Arc<dyn AiCollaborator> = Arc::new(LlmAiCollaborator::new(
        provider,
        config.spec.llm.max_tokens.clone(),
    ));
    let store: Arc<dyn EntityStore> = Arc::new(InMemoryEntityStore::new());
    let hub = NotificationHub::new(config.spec.notifications.channel_capacity);

    let state = Arc::new(AppState::new(store, ai, hub));
    let router = app(state, &config.spec.server);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let port = config.spec.server.port;
    info!(%addr, studio = %config.metadata.name, "FlowOne Voice server listening");
    info!("Health check: http://localhost:{}/health", port);
    info!("API endpoints: http://localhost:{}/api", port);
    info!("WebSocket: ws://localhost:{}/ws", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
