// ABOUTME: Tool dispatcher enforcing dedup, per-tool caps, loop detection, and error containment
// ABOUTME: Routes one model invocation to its handler and folds the outcome into the conversation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Tool Dispatcher
//!
//! `dispatch(invocation, conversation, context)` with these responsibilities:
//!
//! - **Deduplication**: an invocation id already seen in this run is never
//!   re-executed; a `no_action` response is appended so the id still gets
//!   its reply.
//! - **Per-tool call limiting**: tools with an explicit cap are skipped past
//!   it, and a system-role notice asks the model to reuse prior results.
//! - **Loop detection**: an uncapped tool invoked more than the threshold
//!   (3) times raises a loop-abort: system warning injected, fixed
//!   diagnostic becomes the run's final answer, loop stops immediately.
//! - **Error containment**: handler errors become error-status tool results
//!   appended as normal tool messages; the run never crashes on a tool.
//! - **Metrics**: every dispatch logs tool name, duration, an input hash,
//!   and a truncated output, independent of success/failure.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::agent::ConversationContext;
use crate::llm::ToolInvocation;

use super::context::ToolExecutionContext;
use super::registry::ToolRegistry;
use super::result::ToolResult;

/// Fixed diagnostic used as the run's final answer on loop-abort
pub const LOOP_ABORT_ANSWER: &str =
    "I stopped early because I kept repeating the same tool call without making progress. \
     Please review this project manually.";

/// Repetition threshold for tools without an explicit cap
const DEFAULT_LOOP_THRESHOLD: u32 = 3;

/// Characters of tool output preserved in dispatch logs
const LOG_OUTPUT_LIMIT: usize = 200;

/// Whether the orchestration loop should keep going after a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Keep iterating
    Continue,
    /// Loop-abort: stop immediately with the fixed diagnostic answer
    Abort,
}

/// Outcome of routing one invocation
#[derive(Debug, Clone, Copy)]
pub struct DispatchOutcome {
    /// Loop control signal for the orchestration loop
    pub control: LoopControl,
}

/// Routes model tool invocations to registered handlers
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    loop_threshold: u32,
}

impl ToolDispatcher {
    /// Create a dispatcher over a registry with the default repetition threshold
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            loop_threshold: DEFAULT_LOOP_THRESHOLD,
        }
    }

    /// Override the repetition threshold (tests and unusual deployments)
    #[must_use]
    pub const fn with_loop_threshold(mut self, threshold: u32) -> Self {
        self.loop_threshold = threshold;
        self
    }

    /// Dispatch a single invocation, appending its outcome to the conversation
    ///
    /// Invocations are processed strictly in the order the model requested
    /// them; callers must await each dispatch before starting the next so
    /// action-record creation stays deterministic and auditable.
    pub async fn dispatch(
        &self,
        invocation: &ToolInvocation,
        conversation: &mut ConversationContext,
        context: &ToolExecutionContext,
    ) -> DispatchOutcome {
        // An id is processed at most once; duplicates still get a reply so
        // the context stays well-formed.
        if !conversation.mark_invocation_seen(&invocation.id) {
            warn!(
                invocation_id = %invocation.id,
                tool = %invocation.name,
                "Skipping duplicate invocation id"
            );
            conversation.push_tool_response(
                &invocation.id,
                &ToolResult::no_action("duplicate invocation id; already processed"),
            );
            return DispatchOutcome {
                control: LoopControl::Continue,
            };
        }

        let Some(tool) = self.registry.get(&invocation.name) else {
            warn!(tool = %invocation.name, "Model requested unknown tool");
            conversation.push_tool_response(
                &invocation.id,
                &ToolResult::error(format!("unknown tool '{}'", invocation.name)),
            );
            return DispatchOutcome {
                control: LoopControl::Continue,
            };
        };
        let tool = Arc::clone(tool);

        let call_count = conversation.record_tool_call(&invocation.name);

        if let Some(cap) = tool.max_calls_per_run() {
            if call_count > cap {
                conversation.push_tool_response(
                    &invocation.id,
                    &ToolResult::no_action(format!(
                        "'{}' is limited to {cap} call(s) per run",
                        invocation.name
                    )),
                );
                conversation.push_system_notice(format!(
                    "You have already called '{}' the maximum {cap} time(s) this run. \
                     Reuse its earlier results instead of calling it again.",
                    invocation.name
                ));
                info!(
                    tool = %invocation.name,
                    call_count,
                    cap,
                    "Tool call cap reached; invocation skipped"
                );
                return DispatchOutcome {
                    control: LoopControl::Continue,
                };
            }
        } else if call_count > self.loop_threshold {
            conversation.push_tool_response(
                &invocation.id,
                &ToolResult::no_action("repetition detected; run is stopping"),
            );
            conversation.push_system_notice(format!(
                "Tool '{}' has been invoked {call_count} times this run. \
                 The conversation is terminating to prevent a loop.",
                invocation.name
            ));
            warn!(
                tool = %invocation.name,
                call_count,
                threshold = self.loop_threshold,
                "Loop detected; aborting run"
            );
            return DispatchOutcome {
                control: LoopControl::Abort,
            };
        }

        let input_hash = hash_input(&invocation.arguments);
        let started = Instant::now();

        let result = match tool.execute(invocation.arguments.clone(), context).await {
            Ok(result) => result,
            // Containment: a failing tool becomes data the model can react to
            Err(e) => ToolResult::error(e.to_string()),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let output = result.to_message_content();
        info!(
            tool = %invocation.name,
            invocation_id = %invocation.id,
            status = result.status.as_str(),
            duration_ms,
            input_hash = %input_hash,
            output = %truncate(&output, LOG_OUTPUT_LIMIT),
            "Dispatched tool"
        );

        conversation.push_tool_response(&invocation.id, &result);

        DispatchOutcome {
            control: LoopControl::Continue,
        }
    }
}

/// SHA-256 hash of a tool's input arguments, abbreviated for log lines
fn hash_input(arguments: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(arguments.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_owned()
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        text.to_owned()
    } else {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_hash_is_stable_and_short() {
        let a = hash_input(&json!({"recipient": "PM"}));
        let b = hash_input(&json!({"recipient": "PM"}));
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld, this is a long line";
        let cut = truncate(text, 7);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= 10);
    }
}
