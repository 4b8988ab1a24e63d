// ABOUTME: CRM mutation tools creating approval-gated field writes and note appends
// ABOUTME: Implements update_crm_field and append_crm_note action proposals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::actions::{ActionType, NewAction};
use crate::errors::{AppError, AppResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::traits::{AgentTool, ToolCapabilities};

use super::{optional_str, required_str};

/// `update_crm_field`: propose an external CRM field write
pub struct UpdateCrmFieldTool;

#[async_trait]
impl AgentTool for UpdateCrmFieldTool {
    fn name(&self) -> &'static str {
        "update_crm_field"
    }

    fn description(&self) -> &'static str {
        "Propose updating a single CRM field on this project (for example the \
         budget, the expected completion date, or the current phase). The write \
         waits for human approval."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "field": {
                    "type": "string",
                    "description": "CRM field name to update"
                },
                "value": {
                    "description": "New value for the field"
                },
                "reason": {
                    "type": "string",
                    "description": "Why the field should change"
                }
            },
            "required": ["field", "value"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::CREATES_ACTIONS | ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let field = required_str(&args, "field")?;
        let value = args
            .get("value")
            .cloned()
            .ok_or_else(|| AppError::missing_field("value"))?;
        let reason = optional_str(&args, "reason");

        let record = context
            .actions()
            .create(NewAction {
                company_id: context.company_id,
                project_id: context.project_id,
                run_id: Some(context.run_id),
                action_type: ActionType::CrmWrite,
                payload: json!({
                    "field": field,
                    "value": value,
                    "reason": reason,
                }),
                requires_approval: None,
                recipient_contact_id: None,
                sender_contact_id: context.caller_contact_id,
                remind_at: None,
            })
            .await?;

        Ok(ToolResult::ok(json!({
            "action_id": record.id,
            "action_status": record.status,
            "note": "CRM write queued for human approval",
        })))
    }
}

/// `append_crm_note`: propose appending a note to the project's CRM record
pub struct AppendCrmNoteTool;

#[async_trait]
impl AgentTool for AppendCrmNoteTool {
    fn name(&self) -> &'static str {
        "append_crm_note"
    }

    fn description(&self) -> &'static str {
        "Propose appending a free-text note to this project's CRM record. \
         The note waits for human approval."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "note": {
                    "type": "string",
                    "description": "Note text to append"
                }
            },
            "required": ["note"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::CREATES_ACTIONS | ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let note = required_str(&args, "note")?;

        let record = context
            .actions()
            .create(NewAction {
                company_id: context.company_id,
                project_id: context.project_id,
                run_id: Some(context.run_id),
                action_type: ActionType::CrmAppendNote,
                payload: json!({ "note": note }),
                requires_approval: None,
                recipient_contact_id: None,
                sender_contact_id: context.caller_contact_id,
                remind_at: None,
            })
            .await?;

        Ok(ToolResult::ok(json!({
            "action_id": record.id,
            "action_status": record.status,
            "note": "CRM note queued for human approval",
        })))
    }
}
