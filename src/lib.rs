// ABOUTME: Main library entry point for the Beacon project steward agent
// ABOUTME: Exposes the orchestration loop, tools engine, resolver, and persistence layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

#![deny(unsafe_code)]

//! # Beacon Agent
//!
//! An AI-driven project steward: a model-backed agent that inspects project
//! state and, through a constrained set of callable tools, decides whether
//! to message stakeholders, mutate CRM data, escalate, or schedule a future
//! check-in. Side effects are auditable, approval-gated action records.
//!
//! ## Architecture
//!
//! - **`agent`**: the orchestration loop and conversation context
//! - **`tools`**: the tools engine: registry, dispatcher, implementations
//! - **`llm`**: model-endpoint providers and the rate-limited transport
//! - **`actions`**: the action record state machine
//! - **`contacts`**: fuzzy contact resolution
//! - **`database`**: SQLite persistence with company-scoped managers
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use beacon_agent::agent::{AgentRunner, RunOptions};
//! use beacon_agent::llm::{OpenAiCompatibleProvider, RateLimitedTransport};
//! use beacon_agent::tools::ToolRegistry;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = beacon_agent::database::connect("sqlite::memory:").await?;
//!     beacon_agent::database::migrate(&pool).await?;
//!
//!     let provider = Arc::new(OpenAiCompatibleProvider::from_env()?);
//!     let transport = Arc::new(RateLimitedTransport::with_defaults(provider));
//!     let registry = Arc::new(ToolRegistry::with_builtin_tools());
//!
//!     let runner = AgentRunner::new(pool, transport, registry);
//!     let outcome = runner
//!         .run(Uuid::new_v4(), Uuid::new_v4(), "Check on this project", RunOptions::default())
//!         .await?;
//!     println!("{}", outcome.final_answer);
//!     Ok(())
//! }
//! ```

/// Action record state machine for approval-gated side effects
pub mod actions;

/// Orchestration loop and conversation context
pub mod agent;

/// Environment-only runtime configuration
pub mod config;

/// Fuzzy contact resolution
pub mod contacts;

/// SQLite persistence layer
pub mod database;

/// Unified error handling
pub mod errors;

/// LLM providers, transport, pricing, and prompts
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Core domain models
pub mod models;

/// Tools engine: registry, dispatcher, and implementations
pub mod tools;
