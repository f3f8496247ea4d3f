// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! LLM provider adapters implementing [`crate::domain::llm::LLMProvider`].

pub mod anthropic;

use std::sync::Arc;

use crate::domain::config::LlmConfig;
use crate::domain::llm::LLMProvider;

use self::anthropic::AnthropicAdapter;

/// Create the configured provider
pub fn create_provider(config: &LlmConfig) -> anyhow::Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider.as_str() {
        "anthropic" => {
            let api_key = config.resolve_api_key()?;
            Arc::new(AnthropicAdapter::new(
                config.endpoint.clone(),
                api_key,
                config.model.clone(),
            ))
        }
        other => anyhow::bail!("Unsupported provider type: {}", other),
    };

    tracing::info!(provider = %config.provider, model = %config.model, "LLM provider initialized");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_provider() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            api_key: "literal".to_string(),
            ..Default::default()
        };
        assert!(create_provider(&config).is_err());
    }

    #[test]
    fn test_anthropic_with_literal_key() {
        let config = LlmConfig {
            api_key: "literal".to_string(),
            ..Default::default()
        };
        assert!(create_provider(&config).is_ok());
    }
}
