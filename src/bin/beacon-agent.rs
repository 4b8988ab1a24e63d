// ABOUTME: CLI entry point running one agent turn and managing action approvals
// ABOUTME: Subcommands: run (orchestration loop), seed (demo data), approve/reject (operator input)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use beacon_agent::agent::{AgentRunner, RunOptions};
use beacon_agent::config::AgentConfig;
use beacon_agent::database::{self, ActionRecordManager, ContactManager, ProjectManager};
use beacon_agent::database::contacts::NewContact;
use beacon_agent::llm::{
    OpenAiCompatibleProvider, RateLimitedTransport, RetryPolicy, TransportLimits,
};
use beacon_agent::logging::init_logging;
use beacon_agent::tools::ToolRegistry;

#[derive(Parser)]
#[command(name = "beacon-agent", about = "Beacon AI project steward", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one orchestration turn for a project
    Run {
        /// Company scope (authorization boundary)
        #[arg(long)]
        company_id: Uuid,
        /// Project to steward
        #[arg(long)]
        project_id: Uuid,
        /// User prompt for this turn
        #[arg(long)]
        prompt: String,
        /// Model override
        #[arg(long)]
        model: Option<String>,
        /// Iteration cap override
        #[arg(long)]
        max_iterations: Option<u32>,
    },
    /// Seed a demo project with contacts and print the ids
    Seed,
    /// Approve a pending action record
    Approve {
        /// Company scope
        #[arg(long)]
        company_id: Uuid,
        /// Action record to approve
        #[arg(long)]
        action_id: Uuid,
    },
    /// Reject a pending action record
    Reject {
        /// Company scope
        #[arg(long)]
        company_id: Uuid,
        /// Action record to reject
        #[arg(long)]
        action_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = AgentConfig::from_env().context("loading configuration")?;

    let pool = database::connect(&config.database_url)
        .await
        .context("opening database")?;
    database::migrate(&pool).await.context("running migrations")?;

    match cli.command {
        Command::Run {
            company_id,
            project_id,
            prompt,
            model,
            max_iterations,
        } => {
            let provider = Arc::new(OpenAiCompatibleProvider::from_env()?);
            let transport = Arc::new(RateLimitedTransport::new(
                provider,
                TransportLimits {
                    requests_per_minute: config.requests_per_minute,
                    max_in_flight: config.max_in_flight,
                },
                RetryPolicy {
                    max_retries: config.max_retries,
                    ..RetryPolicy::default()
                },
            ));
            let registry = Arc::new(ToolRegistry::with_builtin_tools());
            let runner = AgentRunner::new(pool.clone(), transport, registry);

            let options = RunOptions {
                max_iterations: max_iterations.unwrap_or(config.max_iterations),
                model,
                ..RunOptions::default()
            };

            let outcome = runner.run(company_id, project_id, &prompt, options).await?;

            println!("status: {}", outcome.status.as_str());
            println!("iterations: {}", outcome.iterations);
            println!(
                "tokens: {} prompt / {} completion (${:.4})",
                outcome.metrics.prompt_tokens,
                outcome.metrics.completion_tokens,
                outcome.metrics.cost_usd
            );
            println!("\n{}", outcome.final_answer);

            let actions = ActionRecordManager::new(pool)
                .list_for_run(outcome.run_id, company_id)
                .await?;
            if !actions.is_empty() {
                println!("\nproposed actions:");
                for action in actions {
                    println!(
                        "  {} {} [{}]",
                        action.id,
                        action.action_type.as_str(),
                        action.status.as_str()
                    );
                }
            }
        }
        Command::Seed => {
            let company_id = Uuid::new_v4();
            let projects = ProjectManager::new(pool.clone());
            let contacts = ContactManager::new(pool);

            let project = projects.create(company_id, "Hillcrest Remodel").await?;
            for (name, role, email) in [
                ("Jane Doe", "HO", "jane.doe@example.com"),
                ("Bob Alvarez", "PM", "bob@buildco.example.com"),
                ("Sam Katz", "GC", "sam@katzbuilders.example.com"),
            ] {
                contacts
                    .create(NewContact {
                        company_id,
                        project_id: Some(project.id),
                        name: name.to_owned(),
                        role: Some(role.to_owned()),
                        email: Some(email.to_owned()),
                        phone: None,
                    })
                    .await?;
            }

            println!("company_id: {company_id}");
            println!("project_id: {}", project.id);
        }
        Command::Approve {
            company_id,
            action_id,
        } => {
            let (record, delivery) = ActionRecordManager::new(pool)
                .approve(action_id, company_id)
                .await?;
            println!("action {} is now {}", record.id, record.status.as_str());
            if let Some(delivery) = delivery {
                println!(
                    "delivery requested for recipient {:?}",
                    delivery.recipient_contact_id
                );
            }
        }
        Command::Reject {
            company_id,
            action_id,
        } => {
            let record = ActionRecordManager::new(pool)
                .reject(action_id, company_id)
                .await?;
            println!("action {} is now {}", record.id, record.status.as_str());
        }
    }

    Ok(())
}
