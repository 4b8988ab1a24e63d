// ABOUTME: Append-only conversation context with invocation bookkeeping and usage accounting
// ABOUTME: Includes the structural validator pairing assistant invocations with tool responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Conversation Context
//!
//! The mutable message log, tool catalog, and accumulated usage metrics for
//! one run. Owned exclusively by that run and discarded when it terminates;
//! there is no shared or global conversation state.
//!
//! The context also tracks which invocation ids have been processed (for
//! dispatcher deduplication) and per-tool invocation counts (for caps and
//! loop detection).

use std::collections::{HashMap, HashSet};

use crate::llm::{pricing, ChatCompletion, ChatMessage, TokenUsage, ToolDefinition};
use crate::tools::ToolResult;

/// Cumulative token and cost counters for one conversation
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageTotals {
    /// Prompt tokens across all iterations
    pub prompt_tokens: u64,
    /// Completion tokens across all iterations
    pub completion_tokens: u64,
    /// Computed USD cost across all iterations
    pub cost_usd: f64,
}

/// A missing tool response found by the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Invocation id with no matching tool message
    pub invocation_id: String,
    /// Tool the invocation targeted
    pub tool_name: String,
}

/// The message log, tool catalog, and counters for one orchestration run
#[derive(Debug)]
pub struct ConversationContext {
    messages: Vec<ChatMessage>,
    tools: Vec<ToolDefinition>,
    usage: UsageTotals,
    seen_invocations: HashSet<String>,
    tool_call_counts: HashMap<String, u32>,
}

impl ConversationContext {
    /// Create a context seeded with the system and user prompts
    #[must_use]
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            tools,
            usage: UsageTotals::default(),
            seen_invocations: HashSet::new(),
            tool_call_counts: HashMap::new(),
        }
    }

    /// The ordered message history
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The tool catalog offered on every turn
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Accumulated usage counters
    #[must_use]
    pub const fn usage(&self) -> &UsageTotals {
        &self.usage
    }

    /// Append the assistant's turn (text and/or tool invocations)
    pub fn push_assistant(&mut self, completion: &ChatCompletion) {
        self.messages.push(ChatMessage::assistant_with_tools(
            completion.content.clone(),
            completion.tool_calls.clone(),
        ));
    }

    /// Append a tool response answering one invocation id
    pub fn push_tool_response(&mut self, tool_call_id: &str, result: &ToolResult) {
        self.messages
            .push(ChatMessage::tool(tool_call_id, result.to_message_content()));
    }

    /// Inject a system-role notice (cap reached, loop warning)
    pub fn push_system_notice(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::system(text));
    }

    /// Record an invocation id; returns `false` if it was already processed
    pub fn mark_invocation_seen(&mut self, invocation_id: &str) -> bool {
        self.seen_invocations.insert(invocation_id.to_owned())
    }

    /// Increment and return the per-run invocation count for a tool
    pub fn record_tool_call(&mut self, tool_name: &str) -> u32 {
        let count = self.tool_call_counts.entry(tool_name.to_owned()).or_insert(0);
        *count += 1;
        *count
    }

    /// Current invocation count for a tool
    #[must_use]
    pub fn tool_call_count(&self, tool_name: &str) -> u32 {
        self.tool_call_counts.get(tool_name).copied().unwrap_or(0)
    }

    /// Fold one completion's token usage into the run totals
    pub fn record_usage(&mut self, model: &str, usage: Option<&TokenUsage>) {
        if let Some(usage) = usage {
            self.usage.prompt_tokens += u64::from(usage.prompt_tokens);
            self.usage.completion_tokens += u64::from(usage.completion_tokens);
            self.usage.cost_usd += pricing::cost_usd(model, usage);
        }
    }

    /// Check that every assistant invocation has a matching tool response
    ///
    /// Purely diagnostic: warnings are logged by the caller, never thrown,
    /// and an incomplete context does not abort the run.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let answered: HashSet<&str> = self
            .messages
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        self.messages
            .iter()
            .flat_map(|m| m.tool_calls.iter())
            .filter(|invocation| !answered.contains(invocation.id.as_str()))
            .map(|invocation| ValidationWarning {
                invocation_id: invocation.id.clone(),
                tool_name: invocation.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolInvocation;
    use serde_json::json;

    fn completion_with_calls(calls: Vec<ToolInvocation>) -> ChatCompletion {
        ChatCompletion {
            content: None,
            tool_calls: calls,
            model: "test-model".to_owned(),
            usage: None,
            finish_reason: Some("tool_calls".to_owned()),
        }
    }

    fn invocation(id: &str, name: &str) -> ToolInvocation {
        ToolInvocation {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments: json!({}),
        }
    }

    #[test]
    fn test_validator_flags_missing_responses() {
        let mut conversation = ConversationContext::new("sys", "user", Vec::new());
        conversation.push_assistant(&completion_with_calls(vec![
            invocation("call_1", "send_message"),
            invocation("call_2", "schedule_check_in"),
        ]));
        conversation.push_tool_response("call_1", &ToolResult::text("done"));

        let warnings = conversation.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].invocation_id, "call_2");
        assert_eq!(warnings[0].tool_name, "schedule_check_in");
    }

    #[test]
    fn test_validator_passes_well_formed_context() {
        let mut conversation = ConversationContext::new("sys", "user", Vec::new());
        conversation.push_assistant(&completion_with_calls(vec![invocation(
            "call_1",
            "send_message",
        )]));
        conversation.push_tool_response("call_1", &ToolResult::text("done"));
        assert!(conversation.validate().is_empty());
    }

    #[test]
    fn test_invocation_dedup_bookkeeping() {
        let mut conversation = ConversationContext::new("sys", "user", Vec::new());
        assert!(conversation.mark_invocation_seen("call_1"));
        assert!(!conversation.mark_invocation_seen("call_1"));
    }

    #[test]
    fn test_tool_call_counting() {
        let mut conversation = ConversationContext::new("sys", "user", Vec::new());
        assert_eq!(conversation.record_tool_call("send_message"), 1);
        assert_eq!(conversation.record_tool_call("send_message"), 2);
        assert_eq!(conversation.tool_call_count("send_message"), 2);
        assert_eq!(conversation.tool_call_count("other"), 0);
    }

    #[test]
    fn test_usage_accumulates_across_turns() {
        let mut conversation = ConversationContext::new("sys", "user", Vec::new());
        let usage = crate::llm::TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 20,
            total_tokens: 120,
        };
        conversation.record_usage("gpt-4o-mini", Some(&usage));
        conversation.record_usage("gpt-4o-mini", Some(&usage));
        assert_eq!(conversation.usage().prompt_tokens, 200);
        assert_eq!(conversation.usage().completion_tokens, 40);
        assert!(conversation.usage().cost_usd > 0.0);
    }
}
