// ABOUTME: Action record state machine for approval-gated agent side effects
// ABOUTME: Defines ActionType, ActionStatus, lifecycle transitions, and content-hash dedupe keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Action Records
//!
//! An action record is a persisted, possibly approval-gated proposed side
//! effect (message, data mutation, reminder, escalation). The lifecycle:
//!
//! ```text
//! pending ──approve──▶ approved ──mark_executed──▶ executed
//!    └──────reject──▶ rejected
//! ```
//!
//! Records created with `requires_approval = false` (reminders) skip
//! `pending` entirely and are born `executed`. Approval and rejection are
//! external operator inputs; this module only enforces the transitions.
//!
//! Creation is structurally idempotent: a SHA-256 `dedupe_key` over
//! `(project, type, canonical payload)` lets the database layer return an
//! existing record instead of inserting a duplicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Kind of side effect an action record proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Outbound stakeholder message
    Message,
    /// Internal datastore mutation (e.g., recording a detected decision)
    DataUpdate,
    /// Schedule a future check-in; executes immediately on creation
    SetFutureReminder,
    /// Escalation to a project owner or manager
    Escalation,
    /// External CRM field write
    CrmWrite,
    /// External CRM note append
    CrmAppendNote,
}

impl ActionType {
    /// String representation for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::DataUpdate => "data_update",
            Self::SetFutureReminder => "set_future_reminder",
            Self::Escalation => "escalation",
            Self::CrmWrite => "crm_write",
            Self::CrmAppendNote => "crm_append_note",
        }
    }

    /// Parse from the database representation
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for unknown type strings
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "message" => Ok(Self::Message),
            "data_update" => Ok(Self::DataUpdate),
            "set_future_reminder" => Ok(Self::SetFutureReminder),
            "escalation" => Ok(Self::Escalation),
            "crm_write" => Ok(Self::CrmWrite),
            "crm_append_note" => Ok(Self::CrmAppendNote),
            other => Err(AppError::invalid_input(format!(
                "unknown action type '{other}'"
            ))),
        }
    }

    /// Whether this action type is approval-gated by default
    ///
    /// Destructive and communicative actions wait for a human; reminders
    /// execute immediately.
    #[must_use]
    pub const fn requires_approval_by_default(&self) -> bool {
        !matches!(self, Self::SetFutureReminder)
    }
}

/// Lifecycle state of an action record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Awaiting human approval
    Pending,
    /// Approved; the delivery collaborator will execute it
    Approved,
    /// Rejected by a human operator
    Rejected,
    /// Side effect has taken place
    Executed,
}

impl ActionStatus {
    /// String representation for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
        }
    }

    /// Parse from the database representation
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for unknown status strings
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "executed" => Ok(Self::Executed),
            other => Err(AppError::invalid_input(format!(
                "unknown action status '{other}'"
            ))),
        }
    }
}

/// Request handed to the delivery collaborator when a message or escalation is approved
///
/// Actually sending is outside this core; the record stays `approved` until
/// the collaborator reports back via `mark_executed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// Approved action record id
    pub action_id: Uuid,
    /// Resolved recipient, if contact resolution succeeded at creation time
    pub recipient_contact_id: Option<Uuid>,
    /// Action payload (message body, channel hints, raw recipient string)
    pub payload: Value,
}

/// Parameters for creating a new action record
#[derive(Debug, Clone)]
pub struct NewAction {
    /// Owning company (authorization scope)
    pub company_id: Uuid,
    /// Project the action belongs to
    pub project_id: Uuid,
    /// Run that proposed the action, when created by the agent
    pub run_id: Option<Uuid>,
    /// Kind of side effect
    pub action_type: ActionType,
    /// Free-form payload
    pub payload: Value,
    /// Approval override; None uses the type default
    pub requires_approval: Option<bool>,
    /// Resolved recipient contact
    pub recipient_contact_id: Option<Uuid>,
    /// Sender identity
    pub sender_contact_id: Option<Uuid>,
    /// Reminder timestamp for `set_future_reminder` actions
    pub remind_at: Option<DateTime<Utc>>,
}

/// A persisted, possibly approval-gated proposed side effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Unique record id
    pub id: Uuid,
    /// Owning company
    pub company_id: Uuid,
    /// Project the action belongs to
    pub project_id: Uuid,
    /// Run that proposed the action
    pub run_id: Option<Uuid>,
    /// Kind of side effect
    pub action_type: ActionType,
    /// Free-form payload
    pub payload: Value,
    /// Whether a human must approve before execution
    pub requires_approval: bool,
    /// Lifecycle state
    pub status: ActionStatus,
    /// Resolved recipient contact (None when resolution missed)
    pub recipient_contact_id: Option<Uuid>,
    /// Sender identity
    pub sender_contact_id: Option<Uuid>,
    /// Reminder timestamp for reminder-type actions
    pub remind_at: Option<DateTime<Utc>>,
    /// Content-hash key enforcing creation idempotence
    pub dedupe_key: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Execution timestamp (set when the side effect took place)
    pub executed_at: Option<DateTime<Utc>>,
}

impl ActionRecord {
    /// Create a new record in its initial state
    ///
    /// Approval-gated actions start `pending`; everything else is born
    /// `executed` with its execution timestamp set.
    #[must_use]
    pub fn create(new: NewAction) -> Self {
        let now = Utc::now();
        let requires_approval = new
            .requires_approval
            .unwrap_or_else(|| new.action_type.requires_approval_by_default());
        let (status, executed_at) = if requires_approval {
            (ActionStatus::Pending, None)
        } else {
            (ActionStatus::Executed, Some(now))
        };
        let dedupe_key = compute_dedupe_key(new.project_id, new.action_type, &new.payload);

        Self {
            id: Uuid::new_v4(),
            company_id: new.company_id,
            project_id: new.project_id,
            run_id: new.run_id,
            action_type: new.action_type,
            payload: new.payload,
            requires_approval,
            status,
            recipient_contact_id: new.recipient_contact_id,
            sender_contact_id: new.sender_contact_id,
            remind_at: new.remind_at,
            dedupe_key,
            created_at: now,
            executed_at,
        }
    }

    /// Approve a pending record (external operator input)
    ///
    /// Message and escalation approvals return a [`DeliveryRequest`] for the
    /// delivery collaborator.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidStateTransition` unless the record is `pending`.
    pub fn approve(&mut self) -> AppResult<Option<DeliveryRequest>> {
        if self.status != ActionStatus::Pending {
            return Err(AppError::invalid_transition(format!(
                "cannot approve action in status '{}'",
                self.status.as_str()
            )));
        }
        self.status = ActionStatus::Approved;

        let delivery = matches!(self.action_type, ActionType::Message | ActionType::Escalation)
            .then(|| DeliveryRequest {
                action_id: self.id,
                recipient_contact_id: self.recipient_contact_id,
                payload: self.payload.clone(),
            });
        Ok(delivery)
    }

    /// Reject a pending record (external operator input)
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidStateTransition` unless the record is `pending`.
    pub fn reject(&mut self) -> AppResult<()> {
        if self.status != ActionStatus::Pending {
            return Err(AppError::invalid_transition(format!(
                "cannot reject action in status '{}'",
                self.status.as_str()
            )));
        }
        self.status = ActionStatus::Rejected;
        Ok(())
    }

    /// Record that the approved side effect has taken place
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidStateTransition` unless the record is `approved`.
    pub fn mark_executed(&mut self) -> AppResult<()> {
        if self.status != ActionStatus::Approved {
            return Err(AppError::invalid_transition(format!(
                "cannot execute action in status '{}'",
                self.status.as_str()
            )));
        }
        self.status = ActionStatus::Executed;
        self.executed_at = Some(Utc::now());
        Ok(())
    }
}

/// Compute the content-hash dedupe key for an action
///
/// SHA-256 over the project id, type, and payload with object keys sorted,
/// so semantically identical proposals collide regardless of key order.
#[must_use]
pub fn compute_dedupe_key(project_id: Uuid, action_type: ActionType, payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_id.as_bytes());
    hasher.update(action_type.as_str().as_bytes());
    hasher.update(canonical_json(payload).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Render JSON with object keys sorted recursively
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_action(action_type: ActionType, payload: Value) -> NewAction {
        NewAction {
            company_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            run_id: None,
            action_type,
            payload,
            requires_approval: None,
            recipient_contact_id: None,
            sender_contact_id: None,
            remind_at: None,
        }
    }

    #[test]
    fn test_message_action_starts_pending() {
        let record = ActionRecord::create(new_action(
            ActionType::Message,
            json!({"body": "roof inspection tomorrow"}),
        ));
        assert_eq!(record.status, ActionStatus::Pending);
        assert!(record.requires_approval);
        assert!(record.executed_at.is_none());
    }

    #[test]
    fn test_reminder_is_born_executed() {
        let record = ActionRecord::create(new_action(
            ActionType::SetFutureReminder,
            json!({"days": 7}),
        ));
        assert_eq!(record.status, ActionStatus::Executed);
        assert!(!record.requires_approval);
        assert!(record.executed_at.is_some());
    }

    #[test]
    fn test_approve_then_execute() {
        let mut record =
            ActionRecord::create(new_action(ActionType::Message, json!({"body": "hi"})));
        let delivery = record.approve().unwrap();
        assert!(delivery.is_some());
        assert_eq!(record.status, ActionStatus::Approved);
        record.mark_executed().unwrap();
        assert_eq!(record.status, ActionStatus::Executed);
        assert!(record.executed_at.is_some());
    }

    #[test]
    fn test_crm_write_approval_has_no_delivery_request() {
        let mut record = ActionRecord::create(new_action(
            ActionType::CrmWrite,
            json!({"field": "budget", "value": 125_000}),
        ));
        assert!(record.approve().unwrap().is_none());
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut record =
            ActionRecord::create(new_action(ActionType::Message, json!({"body": "hi"})));
        record.reject().unwrap();
        assert!(record.approve().is_err());
        assert!(record.mark_executed().is_err());
    }

    #[test]
    fn test_dedupe_key_ignores_object_key_order() {
        let project_id = Uuid::new_v4();
        let a = compute_dedupe_key(
            project_id,
            ActionType::Message,
            &json!({"body": "hi", "recipient": "PM"}),
        );
        let b = compute_dedupe_key(
            project_id,
            ActionType::Message,
            &json!({"recipient": "PM", "body": "hi"}),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_dedupe_key_differs_by_type_and_content() {
        let project_id = Uuid::new_v4();
        let message = compute_dedupe_key(project_id, ActionType::Message, &json!({"body": "hi"}));
        let note =
            compute_dedupe_key(project_id, ActionType::CrmAppendNote, &json!({"body": "hi"}));
        let other = compute_dedupe_key(project_id, ActionType::Message, &json!({"body": "bye"}));
        assert_ne!(message, note);
        assert_ne!(message, other);
    }
}
