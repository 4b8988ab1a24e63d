// ABOUTME: Shared test utilities: in-memory database setup, fixtures, and a scripted provider
// ABOUTME: Provides common seeding helpers to reduce duplication across integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

#![allow(dead_code)]

//! Shared test utilities for `beacon_agent` integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use beacon_agent::database::contacts::NewContact;
use beacon_agent::database::{self, ContactManager, ProjectManager};
use beacon_agent::errors::AppError;
use beacon_agent::llm::{
    ChatCompletion, ChatRequest, LlmCapabilities, LlmProvider, TokenUsage, ToolInvocation,
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Standard in-memory test database
///
/// A single connection is required: every new `sqlite::memory:` connection
/// would otherwise get its own empty database.
pub async fn create_test_pool() -> SqlitePool {
    init_test_logging();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    database::migrate(&pool).await.expect("schema migration");
    pool
}

/// Seeded fixture: one project with a homeowner and a project manager
pub struct TestProject {
    pub company_id: Uuid,
    pub project_id: Uuid,
    /// "Jane Doe", role "HO"
    pub jane: Uuid,
    /// "Bob", role "PM"
    pub bob: Uuid,
}

/// Create the standard test project with contacts Jane Doe (HO) and Bob (PM)
pub async fn seed_project(pool: &SqlitePool) -> TestProject {
    let company_id = Uuid::new_v4();
    let project = ProjectManager::new(pool.clone())
        .create(company_id, "Hillcrest Remodel")
        .await
        .expect("create project");

    let contacts = ContactManager::new(pool.clone());
    let jane = contacts
        .create(NewContact {
            company_id,
            project_id: Some(project.id),
            name: "Jane Doe".to_owned(),
            role: Some("HO".to_owned()),
            email: Some("jane.doe@example.com".to_owned()),
            phone: None,
        })
        .await
        .expect("create contact")
        .id;
    let bob = contacts
        .create(NewContact {
            company_id,
            project_id: Some(project.id),
            name: "Bob".to_owned(),
            role: Some("PM".to_owned()),
            email: Some("bob@example.com".to_owned()),
            phone: Some("+1 555 0100".to_owned()),
        })
        .await
        .expect("create contact")
        .id;

    TestProject {
        company_id,
        project_id: project.id,
        jane,
        bob,
    }
}

/// One scripted model turn
pub enum ScriptStep {
    /// Terminal text answer
    Text(String),
    /// A batch of tool invocations
    ToolCalls(Vec<ToolInvocation>),
    /// Provider rate-limit error (retryable)
    RateLimited,
    /// Non-retryable provider failure
    Fail(String),
}

/// Build a tool invocation for scripts
pub fn invocation(id: &str, name: &str, arguments: serde_json::Value) -> ToolInvocation {
    ToolInvocation {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments,
    }
}

/// Scripted provider replaying a fixed sequence of turns
///
/// Each `complete` call consumes the next step. Running past the end of the
/// script is a test bug and returns an internal error.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<ScriptStep>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of `complete` calls made so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted Provider"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::FUNCTION_CALLING | LlmCapabilities::SYSTEM_MESSAGES
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<ChatCompletion, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .expect("script mutex")
            .pop_front()
            .ok_or_else(|| AppError::internal("script exhausted"))?;

        match step {
            ScriptStep::Text(content) => Ok(ChatCompletion {
                content: Some(content),
                tool_calls: Vec::new(),
                model: "scripted-model".to_owned(),
                usage: Some(TokenUsage {
                    prompt_tokens: 100,
                    completion_tokens: 20,
                    total_tokens: 120,
                }),
                finish_reason: Some("stop".to_owned()),
            }),
            ScriptStep::ToolCalls(tool_calls) => Ok(ChatCompletion {
                content: None,
                tool_calls,
                model: "scripted-model".to_owned(),
                usage: Some(TokenUsage {
                    prompt_tokens: 100,
                    completion_tokens: 30,
                    total_tokens: 130,
                }),
                finish_reason: Some("tool_calls".to_owned()),
            }),
            ScriptStep::RateLimited => Err(AppError::external_rate_limited("scripted 429")),
            ScriptStep::Fail(message) => Err(AppError::external_service("llm", message)),
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}
