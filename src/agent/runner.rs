// ABOUTME: The top-level orchestration loop alternating model calls and tool dispatch
// ABOUTME: Bounded by max_iterations with loop-abort, failure, and iteration-cap exit paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Orchestration Loop
//!
//! Given a system prompt, a user prompt, a tool catalog, and an iteration
//! cap (default 5), the runner repeatedly calls the model endpoint with the
//! full message history and returns a terminal natural-language answer, an
//! error diagnostic, or the loop-abort diagnostic.
//!
//! Each iteration: send the ordered history plus tool catalog; if the
//! response has no tool invocations its text is the terminal answer. If it
//! has invocations, each is dispatched strictly in order, the resulting tool
//! messages are appended, and the loop continues. The context is validated
//! after every iteration; structural warnings are logged but never abort the
//! run. The run row and its metrics are persisted on every exit path.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::llm::{get_beacon_system_prompt, ChatRequest, RateLimitedTransport};
use crate::models::{RunMetrics, RunStatus};
use crate::tools::{LoopControl, ToolDispatcher, ToolExecutionContext, ToolRegistry, LOOP_ABORT_ANSWER};

use super::conversation::ConversationContext;

/// Fixed answer when the iteration cap is reached without a terminal response
pub const MAX_ITERATIONS_ANSWER: &str =
    "Maximum iterations reached without a final answer. Please review this project manually.";

/// Default iteration cap for the orchestration loop
const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Options for one orchestration run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Iteration cap (model calls never exceed this)
    pub max_iterations: u32,
    /// Model override (transport default when None)
    pub model: Option<String>,
    /// Offer only these tools instead of every registered tool
    pub tool_allow_list: Option<Vec<String>>,
    /// System prompt override (Beacon steward prompt when None)
    pub system_prompt: Option<String>,
    /// Acting identity recorded as the sender of created actions
    pub caller_contact_id: Option<Uuid>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model: None,
            tool_allow_list: None,
            system_prompt: None,
            caller_contact_id: None,
        }
    }
}

/// Result of one orchestration run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Persisted run id
    pub run_id: Uuid,
    /// Terminal status
    pub status: RunStatus,
    /// Terminal answer (or failure / loop-abort diagnostic)
    pub final_answer: String,
    /// Model-endpoint iterations consumed
    pub iterations: u32,
    /// Token and cost accounting
    pub metrics: RunMetrics,
    /// Structural warnings logged by the validator
    pub validation_warnings: u32,
}

/// The top-level controller for agent runs
pub struct AgentRunner {
    pool: SqlitePool,
    transport: Arc<RateLimitedTransport>,
    dispatcher: ToolDispatcher,
    registry: Arc<ToolRegistry>,
}

impl AgentRunner {
    /// Create a runner over shared transport and registry
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        transport: Arc<RateLimitedTransport>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            pool,
            transport,
            dispatcher: ToolDispatcher::new(Arc::clone(&registry)),
            registry,
        }
    }

    /// Run the orchestration loop for one prompt against one project
    ///
    /// The company/project pair is the authorization boundary: the project
    /// must exist inside the company scope or the run is refused before any
    /// model call is made.
    ///
    /// # Errors
    ///
    /// Returns an error for scope violations and database failures around
    /// run bookkeeping. Transport failures do NOT surface as errors; they
    /// finish the run as `failed` with the diagnostic in `final_answer`.
    pub async fn run(
        &self,
        company_id: Uuid,
        project_id: Uuid,
        user_prompt: &str,
        options: RunOptions,
    ) -> AppResult<RunOutcome> {
        let projects = crate::database::ProjectManager::new(self.pool.clone());
        projects
            .get(project_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("project"))?;

        let runs = crate::database::RunManager::new(self.pool.clone());
        let run = runs.start(company_id, project_id).await?;

        let system_prompt = options
            .system_prompt
            .clone()
            .unwrap_or_else(|| get_beacon_system_prompt().to_owned());
        let tools = self
            .registry
            .definitions(options.tool_allow_list.as_deref());
        let mut conversation = ConversationContext::new(system_prompt, user_prompt, tools);

        let mut context =
            ToolExecutionContext::new(self.pool.clone(), company_id, project_id, run.id);
        if let Some(caller) = options.caller_contact_id {
            context = context.with_caller(caller);
        }

        info!(
            run_id = %run.id,
            %project_id,
            max_iterations = options.max_iterations,
            "Starting orchestration run"
        );

        let mut validation_warnings = 0u32;
        let mut iterations = 0u32;
        let mut terminal: Option<(RunStatus, String)> = None;

        for iteration in 1..=options.max_iterations {
            iterations = iteration;

            let mut request = ChatRequest::new(conversation.messages().to_vec())
                .with_tools(conversation.tools().to_vec());
            if let Some(ref model) = options.model {
                request = request.with_model(model.clone());
            }

            let completion = match self.transport.complete(&request).await {
                Ok(completion) => completion,
                Err(e) => {
                    error!(run_id = %run.id, iteration, "Model call failed: {e}");
                    terminal = Some((RunStatus::Failed, e.to_string()));
                    break;
                }
            };

            conversation.record_usage(&completion.model, completion.usage.as_ref());

            if !completion.has_tool_calls() {
                let answer = completion.content.clone().unwrap_or_default();
                conversation.push_assistant(&completion);
                terminal = Some((RunStatus::Completed, answer));
                break;
            }

            info!(
                run_id = %run.id,
                iteration,
                tool_calls = completion.tool_calls.len(),
                "Dispatching tool invocations"
            );
            conversation.push_assistant(&completion);

            let mut aborted = false;
            for invocation in &completion.tool_calls {
                let outcome = self
                    .dispatcher
                    .dispatch(invocation, &mut conversation, &context)
                    .await;
                if outcome.control == LoopControl::Abort {
                    aborted = true;
                    break;
                }
            }

            for warning in conversation.validate() {
                validation_warnings += 1;
                warn!(
                    run_id = %run.id,
                    invocation_id = %warning.invocation_id,
                    tool = %warning.tool_name,
                    "Invocation has no matching tool response"
                );
            }

            if aborted {
                terminal = Some((RunStatus::Aborted, LOOP_ABORT_ANSWER.to_owned()));
                break;
            }
        }

        let (status, final_answer) =
            terminal.unwrap_or((RunStatus::Completed, MAX_ITERATIONS_ANSWER.to_owned()));

        let usage = conversation.usage();
        let metrics = RunMetrics {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cost_usd: usage.cost_usd,
        };

        runs.finish(run.id, company_id, status, &final_answer, iterations, &metrics)
            .await?;

        info!(
            run_id = %run.id,
            status = status.as_str(),
            iterations,
            prompt_tokens = metrics.prompt_tokens,
            completion_tokens = metrics.completion_tokens,
            "Run finished"
        );

        Ok(RunOutcome {
            run_id: run.id,
            status,
            final_answer,
            iterations,
            metrics,
            validation_warnings,
        })
    }
}
