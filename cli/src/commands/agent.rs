// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use flowone_core::domain::agent::Agent;

use crate::client::{NewAgentRequest, StudioClient};

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List agents on the canvas
    List,

    /// Show one agent as YAML
    Show {
        /// Agent ID
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,
    },

    /// Create an agent
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Personality description
        #[arg(long)]
        persona: String,

        /// System prompt the agent runs with
        #[arg(long)]
        system_prompt: String,

        /// Voice style (default: neutral)
        #[arg(long)]
        voice: Option<String>,

        /// Categorisation tag (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Tool name (repeatable)
        #[arg(long = "tool", value_name = "TOOL")]
        tools: Vec<String>,
    },

    /// Delete an agent
    Delete {
        /// Agent ID
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,
    },
}

pub async fn handle_command(command: AgentCommand, host: &str, port: u16) -> Result<()> {
    let client = StudioClient::new(host, port)?;

    if !client.health().await {
        println!(
            "{}",
            format!("Studio server is not reachable at {}:{}", host, port).red()
        );
        println!("Run 'flowone serve' to start it.");
        return Ok(());
    }

    match command {
        AgentCommand::List => list_agents(client).await,
        AgentCommand::Show { agent_id } => show_agent(&agent_id, client).await,
        AgentCommand::Create {
            name,
            persona,
            system_prompt,
            voice,
            tags,
            tools,
        } => {
            let request = NewAgentRequest {
                name,
                persona,
                system_prompt,
                voice,
                tags,
                tools,
            };
            create_agent(request, client).await
        }
        AgentCommand::Delete { agent_id } => delete_agent(&agent_id, client).await,
    }
}

async fn list_agents(client: StudioClient) -> Result<()> {
    let agents = client.list_agents().await?;

    if agents.is_empty() {
        println!("{}", "No agents found".yellow());
        return Ok(());
    }

    println!("{} agents found:", agents.len());
    println!("{:<38} {:<24} {:<12} {}", "ID", "NAME", "STATUS", "VOICE");
    for agent in &agents {
        print_row(agent);
    }

    Ok(())
}

fn print_row(agent: &Agent) {
    println!(
        "{:<38} {:<24} {:<12} {}",
        agent.id,
        agent.name.bold(),
        agent.status,
        agent.voice
    );
}

async fn show_agent(agent_id: &str, client: StudioClient) -> Result<()> {
    let agent = client.get_agent(agent_id).await?;
    println!("{}", serde_yaml::to_string(&agent)?);
    Ok(())
}

async fn create_agent(request: NewAgentRequest, client: StudioClient) -> Result<()> {
    let agent = client.create_agent(&request).await?;
    println!(
        "{}",
        format!("✓ Agent created: {} ({})", agent.name, agent.id).green()
    );
    Ok(())
}

async fn delete_agent(agent_id: &str, client: StudioClient) -> Result<()> {
    client.delete_agent(agent_id).await?;
    println!("{}", format!("✓ Agent {} deleted", agent_id).green());
    Ok(())
}
