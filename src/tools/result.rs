// ABOUTME: Defines ToolResult and ToolStatus for tool execution responses
// ABOUTME: Results fold back into the conversation as tool messages, errors included
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Tool Result Types
//!
//! A tool execution produces a `ToolResult` with one of three statuses:
//! `success`, `error`, or `no_action`. Errors are data, not exceptions:
//! the dispatcher appends them to the conversation so the model can react.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome status of one tool execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Tool executed and produced a payload
    Success,
    /// Tool failed; the error message is folded into the conversation
    Error,
    /// Tool was skipped or had nothing to do
    NoAction,
}

impl ToolStatus {
    /// String representation used in tool message payloads
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::NoAction => "no_action",
        }
    }
}

/// Result returned by tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Outcome status
    pub status: ToolStatus,
    /// Free-form result payload
    pub payload: Value,
    /// Error message when status is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result with a payload
    #[must_use]
    pub const fn ok(payload: Value) -> Self {
        Self {
            status: ToolStatus::Success,
            payload,
            error: None,
        }
    }

    /// Create a successful text result (convenience method)
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self::ok(Value::String(message.into()))
    }

    /// Create an error result
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            payload: Value::Null,
            error: Some(message.into()),
        }
    }

    /// Create a no-action result with a reason
    #[must_use]
    pub fn no_action(reason: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::NoAction,
            payload: Value::String(reason.into()),
            error: None,
        }
    }

    /// Render the result as the content of a tool message
    ///
    /// Always a JSON object with a `status` field so the model can branch on
    /// the outcome.
    #[must_use]
    pub fn to_message_content(&self) -> String {
        let mut body = serde_json::Map::new();
        body.insert(
            "status".to_owned(),
            Value::String(self.status.as_str().to_owned()),
        );
        if !self.payload.is_null() {
            body.insert("result".to_owned(), self.payload.clone());
        }
        if let Some(ref error) = self.error {
            body.insert("error".to_owned(), Value::String(error.clone()));
        }
        Value::Object(body).to_string()
    }
}

impl Default for ToolResult {
    fn default() -> Self {
        Self::ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_content_carries_status_and_result() {
        let result = ToolResult::ok(json!({"action_id": "abc"}));
        let content: Value = serde_json::from_str(&result.to_message_content()).unwrap();
        assert_eq!(content["status"], "success");
        assert_eq!(content["result"]["action_id"], "abc");
    }

    #[test]
    fn test_error_result_exposes_message() {
        let result = ToolResult::error("boom");
        let content: Value = serde_json::from_str(&result.to_message_content()).unwrap();
        assert_eq!(content["status"], "error");
        assert_eq!(content["error"], "boom");
    }

    #[test]
    fn test_no_action_result() {
        let result = ToolResult::no_action("duplicate invocation");
        assert_eq!(result.status, ToolStatus::NoAction);
    }
}
