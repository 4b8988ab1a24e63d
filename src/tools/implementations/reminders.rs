// ABOUTME: Check-in scheduling tool creating immediately-executed reminder actions
// ABOUTME: Implements schedule_check_in, which also advances the project's next-check timestamp
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::actions::{ActionType, NewAction};
use crate::errors::{AppError, AppResult};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::traits::{AgentTool, ToolCapabilities};

use super::{optional_str, required_u64};

/// Upper bound on how far out a check-in may be scheduled
const MAX_REMINDER_DAYS: u64 = 365;

/// `schedule_check_in`: schedule a future check-in for this project
///
/// Reminders are not approval-gated: the record is created `executed` and
/// the project's next-check timestamp advances in the same creation step.
pub struct ScheduleCheckInTool;

#[async_trait]
impl AgentTool for ScheduleCheckInTool {
    fn name(&self) -> &'static str {
        "schedule_check_in"
    }

    fn description(&self) -> &'static str {
        "Schedule the next automatic check-in for this project a number of days \
         from now. Takes effect immediately; no approval needed."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_REMINDER_DAYS,
                    "description": "Days from now until the next check-in"
                },
                "reason": {
                    "type": "string",
                    "description": "Why this check-in interval was chosen"
                }
            },
            "required": ["days"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::CREATES_ACTIONS | ToolCapabilities::WRITES_DATA
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let days = required_u64(&args, "days")?;
        if days > MAX_REMINDER_DAYS {
            return Err(AppError::invalid_input(format!(
                "'days' must be at most {MAX_REMINDER_DAYS}"
            )));
        }
        let reason = optional_str(&args, "reason");

        let remind_at = Utc::now() + Duration::days(days as i64);

        let record = context
            .actions()
            .create(NewAction {
                company_id: context.company_id,
                project_id: context.project_id,
                run_id: Some(context.run_id),
                action_type: ActionType::SetFutureReminder,
                payload: json!({
                    "days": days,
                    "reason": reason,
                }),
                requires_approval: None,
                recipient_contact_id: None,
                sender_contact_id: context.caller_contact_id,
                remind_at: Some(remind_at),
            })
            .await?;

        Ok(ToolResult::ok(json!({
            "action_id": record.id,
            "action_status": record.status,
            "next_check_at": record.remind_at,
        })))
    }
}
