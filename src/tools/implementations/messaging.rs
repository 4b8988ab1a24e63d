// ABOUTME: Stakeholder messaging tool creating approval-gated message action records
// ABOUTME: Resolves free-text recipients and degrades gracefully on resolution misses
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

/// `send_message`: propose an outbound stakeholder message
///
/// The record is created `pending`; nothing is sent until a human approves.
/// An unresolved recipient is not an error: the record is still created with
/// the raw string preserved in the payload and no recipient contact id.
pub struct SendMessageTool;

#[async_trait]
impl AgentTool for SendMessageTool {
    fn name(&self) -> &'static str {
        "send_message"
    }

    fn description(&self) -> &'static str {
        "Propose a message to a project stakeholder (for example the homeowner or \
         the project manager). The message waits for human approval before it is \
         sent. Recipient may be a name, a role, or an email address."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipient": {
                    "type": "string",
                    "description": "Name, role, or email of the stakeholder to message"
                },
                "body": {
                    "type": "string",
                    "description": "Message text"
                },
                "channel": {
                    "type": "string",
                    "enum": ["email", "sms"],
                    "description": "Preferred delivery channel"
                }
            },
            "required": ["recipient", "body"]
        })
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::CREATES_ACTIONS
            | ToolCapabilities::WRITES_DATA
            | ToolCapabilities::RESOLVES_CONTACTS
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let recipient_raw = required_str(&args, "recipient")?;
        let body = required_str(&args, "body")?;
        let channel = optional_str(&args, "channel");

        let recipient_contact_id = context
            .resolver()
            .resolve(&recipient_raw, context.project_id)
            .await?;

        let record = context
            .actions()
            .create(NewAction {
                company_id: context.company_id,
                project_id: context.project_id,
                run_id: Some(context.run_id),
                action_type: ActionType::Message,
                payload: json!({
                    "recipient_raw": recipient_raw,
                    "body": body,
                    "channel": channel,
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
            "recipient_contact_id": record.recipient_contact_id,
            "recipient_resolved": record.recipient_contact_id.is_some(),
            "note": if record.recipient_contact_id.is_some() {
                "message queued for human approval"
            } else {
                "recipient could not be resolved to a known contact; \
                 message queued for human approval with the raw name"
            },
        })))
    }
}
