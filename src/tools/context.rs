// ABOUTME: Defines ToolExecutionContext providing tools with scoped access to resources
// ABOUTME: Carries the database pool plus the company/project/run identity for every dispatch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Tool Execution Context
//!
//! Unified context object for tool execution, containing:
//! - Company and project scope (the authorization boundary; every
//!   datastore access a tool makes is checked against it)
//! - The run identity for audit linkage of created action records
//! - Access to the shared database pool
//!
//! This replaces scattered parameter passing with one context bundle.

use std::fmt;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::contacts::ContactResolver;
use crate::database::{ActionRecordManager, ContactManager, ProjectManager, RunManager};

/// Context provided to every tool execution
#[derive(Clone)]
pub struct ToolExecutionContext {
    /// Company scope (authorization boundary)
    pub company_id: Uuid,
    /// Project the run operates on
    pub project_id: Uuid,
    /// Run that is dispatching tools
    pub run_id: Uuid,
    /// Acting identity on whose behalf the agent runs, when known
    pub caller_contact_id: Option<Uuid>,
    /// Shared database pool
    pool: SqlitePool,
}

impl ToolExecutionContext {
    /// Create a new context with required scope
    #[must_use]
    pub const fn new(pool: SqlitePool, company_id: Uuid, project_id: Uuid, run_id: Uuid) -> Self {
        Self {
            company_id,
            project_id,
            run_id,
            caller_contact_id: None,
            pool,
        }
    }

    /// Set the acting identity
    #[must_use]
    pub const fn with_caller(mut self, caller_contact_id: Uuid) -> Self {
        self.caller_contact_id = Some(caller_contact_id);
        self
    }

    /// Project database operations scoped to this context
    #[must_use]
    pub fn projects(&self) -> ProjectManager {
        ProjectManager::new(self.pool.clone())
    }

    /// Contact database operations scoped to this context
    #[must_use]
    pub fn contacts(&self) -> ContactManager {
        ContactManager::new(self.pool.clone())
    }

    /// Action record database operations scoped to this context
    #[must_use]
    pub fn actions(&self) -> ActionRecordManager {
        ActionRecordManager::new(self.pool.clone())
    }

    /// Run database operations scoped to this context
    #[must_use]
    pub fn runs(&self) -> RunManager {
        RunManager::new(self.pool.clone())
    }

    /// Contact resolver scoped to this company
    #[must_use]
    pub fn resolver(&self) -> ContactResolver {
        ContactResolver::new(self.pool.clone(), self.company_id)
    }
}

impl fmt::Debug for ToolExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolExecutionContext")
            .field("company_id", &self.company_id)
            .field("project_id", &self.project_id)
            .field("run_id", &self.run_id)
            .field("caller_contact_id", &self.caller_contact_id)
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}
