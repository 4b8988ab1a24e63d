// ABOUTME: Escalation tool creating approval-gated escalation action records
// ABOUTME: Implements escalate_issue, defaulting the target to the project manager
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::actions::{ActionType, NewAction};
use crate::errors::AppResult;
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::traits::{AgentTool, ToolCapabilities};

use super::{optional_str, required_str};

/// `escalate_issue`: flag a problem for human attention
pub struct EscalateIssueTool;

#[async_trait]
impl AgentTool for EscalateIssueTool {
    fn name(&self) -> &'static str {
        "escalate_issue"
    }

    fn description(&self) -> &'static str {
        "Escalate a problem on this project to a human (by default the project \
         manager). Use for blockers, safety concerns, or anything that should \
         not wait for the next check-in. The escalation waits for approval \
         before anyone is notified."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "One-paragraph description of the problem"
                },
                "severity": {
                    "type": "string",
                    "enum": ["low", "medium", "high"],
                    "description": "How urgent the problem is"
                },
                "escalate_to": {
                    "type": "string",
                    "description": "Name or role to escalate to (default: project manager)"
                }
            },
            "required": ["summary"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::CREATES_ACTIONS
            | ToolCapabilities::WRITES_DATA
            | ToolCapabilities::RESOLVES_CONTACTS
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let summary = required_str(&args, "summary")?;
        let severity = optional_str(&args, "severity").unwrap_or_else(|| "medium".to_owned());
        let escalate_to =
            optional_str(&args, "escalate_to").unwrap_or_else(|| "project manager".to_owned());

        let recipient_contact_id = context
            .resolver()
            .resolve(&escalate_to, context.project_id)
            .await?;

        let record = context
            .actions()
            .create(NewAction {
                company_id: context.company_id,
                project_id: context.project_id,
                run_id: Some(context.run_id),
                action_type: ActionType::Escalation,
                payload: json!({
                    "summary": summary,
                    "severity": severity,
                    "escalate_to_raw": escalate_to,
                }),
                requires_approval: None,
                recipient_contact_id,
                sender_contact_id: context.caller_contact_id,
                remind_at: None,
            })
            .await?;

        Ok(ToolResult::ok(json!({
            "action_id": record.id,
            "action_status": record.status,
            "recipient_resolved": record.recipient_contact_id.is_some(),
        })))
    }
}
