// ABOUTME: Read-only project inspection tool feeding current state to the model
// ABOUTME: Implements get_project_status over projects, contacts, and recent actions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::traits::{AgentTool, ToolCapabilities};

/// Number of recent action records included in the status payload
const RECENT_ACTIONS: i64 = 10;

/// `get_project_status`: current project state, stakeholders, and recent actions
pub struct GetProjectStatusTool;

#[async_trait]
impl AgentTool for GetProjectStatusTool {
    fn name(&self) -> &'static str {
        "get_project_status"
    }

    fn description(&self) -> &'static str {
        "Get the current state of the project: status, next scheduled check, \
         stakeholders, and recent proposed actions. Call this before deciding \
         whether anything needs to happen."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA
    }

    async fn execute(&self, _args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let project = context
            .projects()
            .get(context.project_id, context.company_id)
            .await?
            .ok_or_else(|| AppError::not_found("project"))?;

        let contacts = context
            .contacts()
            .list_for_project(context.project_id, context.company_id)
            .await?;

        let recent_actions = context
            .actions()
            .list_recent_for_project(context.project_id, context.company_id, RECENT_ACTIONS)
            .await?;

        Ok(ToolResult::ok(json!({
            "project": {
                "name": project.name,
                "status": project.status,
                "next_check_at": project.next_check_at,
            },
            "contacts": contacts
                .iter()
                .map(|c| json!({
                    "name": c.name,
                    "role": c.role,
                    "has_email": c.email.is_some(),
                    "has_phone": c.phone.is_some(),
                }))
                .collect::<Vec<_>>(),
            "recent_actions": recent_actions
                .iter()
                .map(|a| json!({
                    "type": a.action_type,
                    "status": a.status,
                    "created_at": a.created_at,
                    "payload": a.payload,
                }))
                .collect::<Vec<_>>(),
        })))
    }
}
