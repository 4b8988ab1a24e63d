// ABOUTME: Integration tests for the orchestration loop with a scripted model provider
// ABOUTME: Covers terminal answers, iteration caps, loop-abort, failures, and action side effects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{create_test_pool, invocation, seed_project, ScriptStep, ScriptedProvider};

use beacon_agent::actions::{ActionStatus, ActionType};
use beacon_agent::agent::{AgentRunner, RunOptions, MAX_ITERATIONS_ANSWER};
use beacon_agent::database::contacts::NewContact;
use beacon_agent::database::{ActionRecordManager, ContactManager, ProjectManager, RunManager};
use beacon_agent::errors::ErrorCode;
use beacon_agent::llm::{RateLimitedTransport, RetryPolicy, TransportLimits};
use beacon_agent::models::RunStatus;
use beacon_agent::tools::{ToolRegistry, LOOP_ABORT_ANSWER};
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

fn build_runner(pool: &SqlitePool, provider: Arc<ScriptedProvider>) -> AgentRunner {
    let transport = Arc::new(RateLimitedTransport::new(
        provider,
        TransportLimits::default(),
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(5),
            max_jitter: Duration::from_millis(2),
        },
    ));
    AgentRunner::new(
        pool.clone(),
        transport,
        Arc::new(ToolRegistry::with_builtin_tools()),
    )
}

#[tokio::test]
async fn test_terminal_answer_on_first_turn() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    let provider = Arc::new(ScriptedProvider::new(vec![ScriptStep::Text(
        "Everything is on track; nothing to do.".to_owned(),
    )]));
    let runner = build_runner(&pool, Arc::clone(&provider));

    let outcome = runner
        .run(
            fixture.company_id,
            fixture.project_id,
            "Check on this project",
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.final_answer, "Everything is on track; nothing to do.");
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.validation_warnings, 0);
    assert_eq!(provider.calls(), 1);
    assert_eq!(outcome.metrics.prompt_tokens, 100);
    assert_eq!(outcome.metrics.completion_tokens, 20);

    // Run row persisted with the terminal state
    let run = RunManager::new(pool)
        .get(outcome.run_id, fixture.company_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.final_answer.as_deref(), Some(outcome.final_answer.as_str()));
    assert_eq!(run.iterations, 1);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_tool_call_then_answer_creates_resolved_message_action() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::ToolCalls(vec![invocation(
            "call_1",
            "send_message",
            json!({"recipient": "Homeowner", "body": "Inspection is set for Friday."}),
        )]),
        ScriptStep::Text("I proposed a message to the homeowner.".to_owned()),
    ]));
    let runner = build_runner(&pool, Arc::clone(&provider));

    let outcome = runner
        .run(
            fixture.company_id,
            fixture.project_id,
            "Keep the homeowner informed",
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.validation_warnings, 0);
    assert_eq!(provider.calls(), 2);

    let actions = ActionRecordManager::new(pool)
        .list_for_run(outcome.run_id, fixture.company_id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
    let action = &actions[0];
    assert_eq!(action.action_type, ActionType::Message);
    assert_eq!(action.status, ActionStatus::Pending);
    // "Homeowner" resolves to Jane through the role alias table
    assert_eq!(action.recipient_contact_id, Some(fixture.jane));
}

#[tokio::test]
async fn test_unresolved_recipient_still_creates_action_and_run_completes() {
    let pool = create_test_pool().await;

    // A project whose only contact is the PM: "Homeowner" cannot resolve
    let company_id = Uuid::new_v4();
    let project = ProjectManager::new(pool.clone())
        .create(company_id, "Maple Street Addition")
        .await
        .unwrap();
    ContactManager::new(pool.clone())
        .create(NewContact {
            company_id,
            project_id: Some(project.id),
            name: "Bob".to_owned(),
            role: Some("PM".to_owned()),
            email: None,
            phone: None,
        })
        .await
        .unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::ToolCalls(vec![invocation(
            "call_1",
            "send_message",
            json!({"recipient": "Homeowner", "body": "Your permit was approved."}),
        )]),
        ScriptStep::Text("Message proposed; the homeowner contact was ambiguous.".to_owned()),
    ]));
    let runner = build_runner(&pool, provider);

    let outcome = runner
        .run(company_id, project.id, "Share the permit news", RunOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);

    let actions = ActionRecordManager::new(pool)
        .list_for_run(outcome.run_id, company_id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
    // Record created anyway: no recipient id, raw string preserved
    assert_eq!(actions[0].recipient_contact_id, None);
    assert_eq!(actions[0].payload["recipient_raw"], "Homeowner");
}

#[tokio::test]
async fn test_reminder_tool_bumps_project_next_check() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::ToolCalls(vec![invocation(
            "call_1",
            "schedule_check_in",
            json!({"days": 10, "reason": "quiet week expected"}),
        )]),
        ScriptStep::Text("Next check-in scheduled in 10 days.".to_owned()),
    ]));
    let runner = build_runner(&pool, provider);

    let outcome = runner
        .run(
            fixture.company_id,
            fixture.project_id,
            "Nothing urgent; schedule the next look",
            RunOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);

    let actions = ActionRecordManager::new(pool.clone())
        .list_for_run(outcome.run_id, fixture.company_id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action_type, ActionType::SetFutureReminder);
    assert_eq!(actions[0].status, ActionStatus::Executed);

    let project = ProjectManager::new(pool)
        .get(fixture.project_id, fixture.company_id)
        .await
        .unwrap()
        .unwrap();
    let next_check = project.next_check_at.expect("next check advanced");
    let days_out = (next_check - chrono::Utc::now()).num_days();
    assert!((9..=10).contains(&days_out), "next check ~10 days out, got {days_out}");
}

#[tokio::test]
async fn test_iteration_cap_yields_fixed_answer() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    // Rotate tools so the repetition threshold never trips before the cap
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::ToolCalls(vec![invocation("call_1", "get_project_status", json!({}))]),
        ScriptStep::ToolCalls(vec![invocation(
            "call_2",
            "append_crm_note",
            json!({"note": "first pass"}),
        )]),
        ScriptStep::ToolCalls(vec![invocation(
            "call_3",
            "update_crm_field",
            json!({"field": "phase", "value": "framing"}),
        )]),
    ]));
    let runner = build_runner(&pool, Arc::clone(&provider));

    let outcome = runner
        .run(
            fixture.company_id,
            fixture.project_id,
            "Audit this project",
            RunOptions {
                max_iterations: 3,
                ..RunOptions::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.final_answer, MAX_ITERATIONS_ANSWER);
    assert_eq!(outcome.iterations, 3);
    // Model calls never exceed the cap
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_repetition_aborts_before_iteration_cap() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    // The same uncapped tool every turn trips the threshold on call 4
    let steps = (1..=5)
        .map(|i| {
            ScriptStep::ToolCalls(vec![invocation(
                &format!("call_{i}"),
                "get_project_status",
                json!({}),
            )])
        })
        .collect();
    let provider = Arc::new(ScriptedProvider::new(steps));
    let runner = build_runner(&pool, Arc::clone(&provider));

    let outcome = runner
        .run(
            fixture.company_id,
            fixture.project_id,
            "Audit this project",
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Aborted);
    assert_eq!(outcome.final_answer, LOOP_ABORT_ANSWER);
    // Terminated before the iteration cap of 5
    assert_eq!(provider.calls(), 4);

    let run = RunManager::new(pool)
        .get(outcome.run_id, fixture.company_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.status, RunStatus::Aborted);
}

#[tokio::test]
async fn test_duplicate_invocation_ids_in_one_batch_execute_once() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    let call = invocation(
        "call_1",
        "append_crm_note",
        json!({"note": "windows ordered"}),
    );
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::ToolCalls(vec![call.clone(), call]),
        ScriptStep::Text("Noted the window order.".to_owned()),
    ]));
    let runner = build_runner(&pool, provider);

    let outcome = runner
        .run(
            fixture.company_id,
            fixture.project_id,
            "Log the window order",
            RunOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.validation_warnings, 0);

    let actions = ActionRecordManager::new(pool)
        .list_for_run(outcome.run_id, fixture.company_id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
}

#[tokio::test]
async fn test_transport_failure_marks_run_failed() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    let provider = Arc::new(ScriptedProvider::new(vec![ScriptStep::Fail(
        "endpoint unreachable".to_owned(),
    )]));
    let runner = build_runner(&pool, Arc::clone(&provider));

    let outcome = runner
        .run(
            fixture.company_id,
            fixture.project_id,
            "Check on this project",
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Failed);
    assert!(outcome.final_answer.contains("endpoint unreachable"));
    assert_eq!(provider.calls(), 1);

    let run = RunManager::new(pool)
        .get(outcome.run_id, fixture.company_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run
        .final_answer
        .as_deref()
        .unwrap()
        .contains("endpoint unreachable"));
}

#[tokio::test]
async fn test_rate_limit_is_retried_transparently() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::RateLimited,
        ScriptStep::Text("All quiet.".to_owned()),
    ]));
    let runner = build_runner(&pool, Arc::clone(&provider));

    let outcome = runner
        .run(
            fixture.company_id,
            fixture.project_id,
            "Check on this project",
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.final_answer, "All quiet.");
    // One rate-limited attempt plus one successful retry
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_run_refused_outside_company_scope() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    let provider = Arc::new(ScriptedProvider::new(vec![ScriptStep::Text(
        "unreachable".to_owned(),
    )]));
    let runner = build_runner(&pool, Arc::clone(&provider));

    let err = runner
        .run(
            Uuid::new_v4(),
            fixture.project_id,
            "Check on this project",
            RunOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    // Refused before any model call
    assert_eq!(provider.calls(), 0);
}
