// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use flowone_core::domain::config::StudioConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with every default spelled out
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./flowone-config.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(&output),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = StudioConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. FLOWONE_CONFIG_PATH: {}",
            std::env::var("FLOWONE_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./flowone-config.yaml");
        println!("  4. ~/.flowone/config.yaml");
        println!("  5. /etc/flowone/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Studio:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let server = &config.spec.server;
    println!("{}", "Server:".bold());
    println!("  Listen: {}", config.bind_addr());
    println!("  Frontend origin: {}", server.frontend_url);
    println!();

    let llm = &config.spec.llm;
    println!("{}", "LLM:".bold());
    println!("  {} ({})", llm.model.bold(), llm.provider);
    println!("  Endpoint: {}", llm.endpoint);
    let key_state = match llm.resolve_api_key() {
        Ok(_) => "resolved".green(),
        Err(_) => "missing".red(),
    };
    println!("  API key: {} [{}]", llm.api_key, key_state);
    println!(
        "  Max tokens: interpret {} / run {} / adapt {}",
        llm.max_tokens.interpret, llm.max_tokens.run, llm.max_tokens.adapt
    );
    println!();

    println!("{}", "Notifications:".bold());
    println!(
        "  Channel capacity: {}",
        config.spec.notifications.channel_capacity
    );
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = StudioConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path) -> Result<()> {
    StudioConfigManifest::default()
        .to_yaml_file(output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
