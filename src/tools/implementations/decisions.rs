// ABOUTME: Decision-detection tool scanning recent project activity for committed decisions
// ABOUTME: Capped at one call per run; detected decisions become data_update action proposals
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

/// How many recent actions are scanned for decision language
const SCAN_WINDOW: i64 = 25;

/// Phrases that mark a committed decision in notes and messages
const DECISION_MARKERS: &[&str] = &[
    "decided to",
    "decision:",
    "approved the",
    "we will go with",
    "selected the",
    "signed off on",
];

/// `detect_decisions`: scan recent project activity for committed decisions
///
/// Expensive relative to other tools, so it is capped at one call per run;
/// past the cap the dispatcher asks the model to reuse the earlier results.
/// Each detected decision is recorded as a `data_update` action proposal.
pub struct DetectDecisionsTool;

#[async_trait]
impl AgentTool for DetectDecisionsTool {
    fn name(&self) -> &'static str {
        "detect_decisions"
    }

    fn description(&self) -> &'static str {
        "Scan recent project notes and messages for decisions that were made \
         but never recorded in the CRM. Call at most once per conversation and \
         reuse the results."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::CREATES_ACTIONS
    }

    fn max_calls_per_run(&self) -> Option<u32> {
        Some(1)
    }

    async fn execute(&self, _args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let recent = context
            .actions()
            .list_recent_for_project(context.project_id, context.company_id, SCAN_WINDOW)
            .await?;

        let mut detected = Vec::new();
        for record in &recent {
            for text in text_fields(&record.payload) {
                let lowered = text.to_lowercase();
                if let Some(marker) = DECISION_MARKERS.iter().find(|m| lowered.contains(**m)) {
                    detected.push(json!({
                        "source_action_id": record.id,
                        "marker": marker,
                        "excerpt": excerpt(&text),
                    }));
                    break;
                }
            }
        }

        if detected.is_empty() {
            return Ok(ToolResult::no_action("no unrecorded decisions detected"));
        }

        let mut proposals = Vec::with_capacity(detected.len());
        for decision in &detected {
            let record = context
                .actions()
                .create(NewAction {
                    company_id: context.company_id,
                    project_id: context.project_id,
                    run_id: Some(context.run_id),
                    action_type: ActionType::DataUpdate,
                    payload: json!({
                        "kind": "record_decision",
                        "decision": decision,
                    }),
                    requires_approval: None,
                    recipient_contact_id: None,
                    sender_contact_id: context.caller_contact_id,
                    remind_at: None,
                })
                .await?;
            proposals.push(record.id);
        }

        Ok(ToolResult::ok(json!({
            "decisions": detected,
            "proposed_action_ids": proposals,
        })))
    }
}

/// Collect the string leaves of a payload worth scanning
fn text_fields(payload: &Value) -> Vec<String> {
    match payload {
        Value::String(s) => vec![s.clone()],
        Value::Object(map) => map.values().flat_map(text_fields).collect(),
        Value::Array(items) => items.iter().flat_map(text_fields).collect(),
        _ => Vec::new(),
    }
}

fn excerpt(text: &str) -> String {
    let mut end = text.len().min(160);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_owned()
}
