// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Studio Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing:
// - HTTP/WebSocket listener and the CORS origin of the canvas frontend
// - The hosted LLM used by the AI collaborator
// - Fan-out channel sizing
// - Logging

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "flowone.dev/v1";
pub const KIND: &str = "StudioConfig";

/// Top-level studio configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfigManifest {
    /// API version (must be "flowone.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "StudioConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: StudioConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable deployment name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudioConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP and WebSocket port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed by CORS (the canvas frontend)
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider type; only "anthropic" is supported
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key (supports "env:VAR_NAME")
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub max_tokens: TokenLimits,
}

/// Per-operation completion limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLimits {
    #[serde(default = "default_interpret_tokens")]
    pub interpret: u32,

    #[serde(default = "default_run_tokens")]
    pub run: u32,

    #[serde(default = "default_adapt_tokens")]
    pub adapt: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Events buffered per subscriber before the slowest ones lag
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_api_key() -> String {
    "env:ANTHROPIC_API_KEY".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_interpret_tokens() -> u32 {
    2000
}

fn default_run_tokens() -> u32 {
    1500
}

fn default_adapt_tokens() -> u32 {
    1000
}

fn default_channel_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            frontend_url: default_frontend_url(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            api_key: default_api_key(),
            model: default_model(),
            max_tokens: TokenLimits::default(),
        }
    }
}

impl Default for TokenLimits {
    fn default() -> Self {
        Self {
            interpret: default_interpret_tokens(),
            run: default_run_tokens(),
            adapt: default_adapt_tokens(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for StudioConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "flowone-studio".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                labels: None,
            },
            spec: StudioConfigSpec::default(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key, expanding "env:VAR_NAME" references
    pub fn resolve_api_key(&self) -> anyhow::Result<String> {
        match self.api_key.strip_prefix("env:") {
            Some(var_name) => std::env::var(var_name)
                .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
            None => Ok(self.api_key.clone()),
        }
    }
}

impl StudioConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. FLOWONE_CONFIG_PATH environment variable
    /// 2. ./flowone-config.yaml (working directory)
    /// 3. ~/.flowone/config.yaml (user home)
    /// 4. /etc/flowone/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("FLOWONE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./flowone-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".flowone").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/flowone/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // An explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::warn!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Logging settings of the configuration `load_or_default` would pick,
    /// read without emitting any log lines. Unreadable files yield defaults.
    pub fn logging_settings(cli_path: Option<PathBuf>) -> LoggingConfig {
        cli_path
            .or_else(Self::discover_config)
            .and_then(|path| Self::from_yaml_file(path).ok())
            .map(|config| config.spec.observability.logging)
            .unwrap_or_default()
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for PORT: '{}'. Ignoring.", val);
                }
            }
        }

        if let Ok(val) = std::env::var("FRONTEND_URL") {
            tracing::info!("Environment override: FRONTEND_URL={}", val);
            self.spec.server.frontend_url = val;
        }

        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            tracing::info!("Environment override: ANTHROPIC_API_KEY");
            self.spec.llm.api_key = "env:ANTHROPIC_API_KEY".to_string();
        }

        if let Ok(val) = std::env::var("FLOWONE_LLM_ENDPOINT") {
            tracing::info!("Environment override: FLOWONE_LLM_ENDPOINT={}", val);
            self.spec.llm.endpoint = val;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let llm = &self.spec.llm;
        if llm.provider != "anthropic" {
            anyhow::bail!("Unsupported LLM provider: {}", llm.provider);
        }

        if llm.endpoint.is_empty() {
            anyhow::bail!("LLM endpoint cannot be empty");
        }

        if llm.model.is_empty() {
            anyhow::bail!("LLM model cannot be empty");
        }

        let limits = &llm.max_tokens;
        if limits.interpret == 0 || limits.run == 0 || limits.adapt == 0 {
            anyhow::bail!("LLM max_tokens limits must be greater than zero");
        }

        if self.spec.notifications.channel_capacity == 0 {
            anyhow::bail!("notifications.channel_capacity must be greater than zero");
        }

        Ok(())
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.spec.server.bind_address, self.spec.server.port)
    }
}
