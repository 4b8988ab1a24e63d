// ABOUTME: Central registry for agent tools with name lookup and catalog listing
// ABOUTME: Built once at startup; the dispatcher resolves handlers through it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Tool Registry
//!
//! Name→handler map for agent tools, providing:
//! - Tool registration and lookup
//! - Catalog listing filtered by a caller-supplied allow-list
//!
//! The registry is built once at startup and then used immutably; all
//! registered tools are `Arc`-wrapped for sharing across async tasks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::llm::ToolDefinition;

use super::traits::{definition_for, AgentTool};

/// Central registry for agent tools
pub struct ToolRegistry {
    /// Registered tools by name
    tools: HashMap<String, Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with all built-in tools registered
    #[must_use]
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_tools();
        registry
    }

    /// Register a tool in the registry
    ///
    /// # Returns
    ///
    /// `true` if the tool was registered, `false` if a tool with the same name exists
    pub fn register(&mut self, tool: Arc<dyn AgentTool>) -> bool {
        let name = tool.name().to_owned();

        if self.tools.contains_key(&name) {
            warn!("Tool '{}' is already registered, skipping", name);
            return false;
        }

        debug!(
            "Registering tool '{}' with capabilities: {}",
            name,
            tool.capabilities().describe()
        );
        self.tools.insert(name, tool);
        true
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentTool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List all tool names
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Build the tool catalog advertised to the model
    ///
    /// When an allow-list is supplied only those tools are offered; unknown
    /// names in the list are ignored with a warning. Without an allow-list,
    /// every registered tool is offered.
    #[must_use]
    pub fn definitions(&self, allow_list: Option<&[String]>) -> Vec<ToolDefinition> {
        match allow_list {
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let tool = self.tools.get(name);
                    if tool.is_none() {
                        warn!("Allow-listed tool '{}' is not registered", name);
                    }
                    tool
                })
                .map(|tool| definition_for(tool.as_ref()))
                .collect(),
            None => {
                let mut definitions: Vec<ToolDefinition> = self
                    .tools
                    .values()
                    .map(|tool| definition_for(tool.as_ref()))
                    .collect();
                definitions.sort_by(|a, b| a.name.cmp(&b.name));
                definitions
            }
        }
    }

    /// Register all built-in tools
    pub fn register_builtin_tools(&mut self) {
        for tool in super::implementations::create_builtin_tools() {
            self.register(Arc::from(tool));
        }
        info!("Registered {} built-in tools", self.len());
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .field("tools", &self.tool_names())
            .finish()
    }
}
