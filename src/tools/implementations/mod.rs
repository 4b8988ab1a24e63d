// ABOUTME: Module containing all agent tool implementations organized by concern
// ABOUTME: Exposes create_builtin_tools for registry construction at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Tool Implementations
//!
//! All agent tool implementations, organized by concern:
//!
//! - `status` - `get_project_status` (read-only project inspection)
//! - `messaging` - `send_message` (approval-gated stakeholder messages)
//! - `crm` - `update_crm_field`, `append_crm_note` (approval-gated CRM writes)
//! - `reminders` - `schedule_check_in` (immediate-execute future reminders)
//! - `escalation` - `escalate_issue` (approval-gated escalations)
//! - `decisions` - `detect_decisions` (single-call decision scan)

pub mod crm;
pub mod decisions;
pub mod escalation;
pub mod messaging;
pub mod reminders;
pub mod status;

use serde_json::Value;

use super::traits::AgentTool;
use crate::errors::{AppError, AppResult};

/// Create one instance of every built-in tool
#[must_use]
pub fn create_builtin_tools() -> Vec<Box<dyn AgentTool>> {
    vec![
        Box::new(status::GetProjectStatusTool),
        Box::new(messaging::SendMessageTool),
        Box::new(crm::UpdateCrmFieldTool),
        Box::new(crm::AppendCrmNoteTool),
        Box::new(reminders::ScheduleCheckInTool),
        Box::new(escalation::EscalateIssueTool),
        Box::new(decisions::DetectDecisionsTool),
    ]
}

/// Extract a required string argument
pub(crate) fn required_str(args: &Value, field: &str) -> AppResult<String> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| AppError::missing_field(field))
}

/// Extract an optional string argument
pub(crate) fn optional_str(args: &Value, field: &str) -> Option<String> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// Extract a required positive integer argument
pub(crate) fn required_u64(args: &Value, field: &str) -> AppResult<u64> {
    args.get(field)
        .and_then(Value::as_u64)
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            AppError::invalid_input(format!("'{field}' must be a positive integer"))
        })
}
