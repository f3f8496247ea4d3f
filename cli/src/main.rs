// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # FlowOne Voice Studio CLI
//!
//! The `flowone` binary runs the studio backend and talks to a running one.
//!
//! ## Commands
//!
//! - `flowone serve` - Run the HTTP/WebSocket server in the foreground
//! - `flowone agent list|show|create|delete` - Agent operations against a running server
//! - `flowone config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use flowone::commands::{self, AgentCommand, ConfigCommand};
use flowone::server;
use flowone_core::domain::config::{LoggingConfig, StudioConfigManifest};

/// FlowOne Voice - visual studio for voice AI agents
#[derive(Parser)]
#[command(name = "flowone")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Studio server host used by client commands
    #[arg(long, global = true, env = "FLOWONE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Studio server port (default: from configuration)
    #[arg(long, global = true, env = "FLOWONE_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FLOWONE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the studio server
    #[command(name = "serve")]
    Serve,

    /// Agent operations
    #[command(name = "agent")]
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // A broken config file falls back to default logging and is reported
    // by the command once the subscriber is installed.
    let logging = StudioConfigManifest::logging_settings(cli.config.clone());
    init_logging(cli.log_level.as_deref().unwrap_or(&logging.level), &logging)?;
    let loaded = StudioConfigManifest::load_or_default(cli.config.clone());

    match cli.command {
        Some(Commands::Serve) => {
            let mut config = loaded.context("Failed to load configuration")?;
            if let Some(port) = cli.port {
                config.spec.server.port = port;
            }
            server::start_server(config).await
        }
        Some(Commands::Agent { command }) => {
            let port = match (cli.port, &loaded) {
                (Some(port), _) => port,
                (None, Ok(config)) => config.spec.server.port,
                (None, Err(_)) => StudioConfigManifest::default().spec.server.port,
            };
            commands::agent::handle_command(command, &cli.host, port).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
