// ABOUTME: Defines the AgentTool trait and ToolCapabilities for the pluggable tools architecture
// ABOUTME: Tools implement this trait to be registered and executed via the ToolRegistry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Agent Tool Trait and Capabilities
//!
//! Core abstraction for agent tools. All tools implement the `AgentTool`
//! trait which provides:
//! - Tool metadata (name, description, parameter schema)
//! - Capability flags for filtering and logging
//! - An optional per-run call cap
//! - Async execution with context

use async_trait::async_trait;
use bitflags::bitflags;
use serde_json::Value;

use crate::errors::AppResult;
use crate::llm::ToolDefinition;

use super::context::ToolExecutionContext;
use super::result::ToolResult;

bitflags! {
    /// Capabilities that tools declare for filtering and discovery.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToolCapabilities: u8 {
        /// Tool reads project data
        const READS_DATA = 0b0000_0001;
        /// Tool writes/modifies data
        const WRITES_DATA = 0b0000_0010;
        /// Tool creates action records
        const CREATES_ACTIONS = 0b0000_0100;
        /// Tool resolves contacts
        const RESOLVES_CONTACTS = 0b0000_1000;
    }
}

impl ToolCapabilities {
    /// Check if the tool reads data
    #[must_use]
    pub const fn reads_data(self) -> bool {
        self.contains(Self::READS_DATA)
    }

    /// Check if the tool writes data
    #[must_use]
    pub const fn writes_data(self) -> bool {
        self.contains(Self::WRITES_DATA)
    }

    /// Check if the tool creates action records
    #[must_use]
    pub const fn creates_actions(self) -> bool {
        self.contains(Self::CREATES_ACTIONS)
    }

    /// Get a description of enabled capabilities for logging
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.contains(Self::READS_DATA) {
            parts.push("reads_data");
        }
        if self.contains(Self::WRITES_DATA) {
            parts.push("writes_data");
        }
        if self.contains(Self::CREATES_ACTIONS) {
            parts.push("creates_actions");
        }
        if self.contains(Self::RESOLVES_CONTACTS) {
            parts.push("resolves_contacts");
        }
        if parts.is_empty() {
            "none".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// The main trait that all agent tools must implement.
///
/// Tools are registered with the `ToolRegistry` and invoked by the
/// dispatcher when the model requests them.
///
/// # Design Notes
///
/// - Tools are `Send + Sync` for safe sharing across async tasks
/// - `name()` returns `&'static str` for zero-allocation tool lookup
/// - `max_calls_per_run()` lets a tool opt into an explicit per-run cap;
///   tools without one fall under the dispatcher's loop-detection threshold
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Unique identifier for the tool (e.g., `send_message`)
    fn name(&self) -> &'static str;

    /// Human-readable description for LLM consumption
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn parameters_schema(&self) -> Value;

    /// Capability flags for filtering and logging
    fn capabilities(&self) -> ToolCapabilities;

    /// Explicit per-run invocation cap, if any
    ///
    /// Once reached, further invocations are skipped and the model is asked
    /// to reuse prior results. Tools returning `None` are instead subject to
    /// the dispatcher's repetition threshold.
    fn max_calls_per_run(&self) -> Option<u32> {
        None
    }

    /// Execute the tool with given arguments and context
    ///
    /// # Errors
    ///
    /// Returns `AppError` for validation or execution failures. The
    /// dispatcher converts errors into error-status tool results; a failing
    /// tool never aborts the run.
    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult>;
}

/// Build the catalog entry advertised to the model for a tool
#[must_use]
pub fn definition_for(tool: &dyn AgentTool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_owned(),
        description: tool.description().to_owned(),
        parameters: tool.parameters_schema(),
    }
}
