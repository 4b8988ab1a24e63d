// ABOUTME: Core domain models for projects, contacts, and agent runs
// ABOUTME: Shared data structures referenced by the database layer, tools, and orchestration loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Domain Models
//!
//! Common data structures for the Beacon agent. Action records live in
//! [`crate::actions`] because they carry state-machine behavior; everything
//! here is plain data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// A managed project (one renovation/construction engagement)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,
    /// Owning company (authorization scope for every query)
    pub company_id: Uuid,
    /// Display name
    pub name: String,
    /// Project lifecycle status
    pub status: ProjectStatus,
    /// When the agent should next look at this project
    pub next_check_at: Option<DateTime<Utc>>,
    /// When the project was created
    pub created_at: DateTime<Utc>,
    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Work is in progress
    Active,
    /// Paused, awaiting external input
    OnHold,
    /// Finished or cancelled
    Closed,
}

impl ProjectStatus {
    /// String representation for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Closed => "closed",
        }
    }

    /// Parse from the database representation
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for unknown status strings
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(Self::Active),
            "on_hold" => Ok(Self::OnHold),
            "closed" => Ok(Self::Closed),
            other => Err(AppError::invalid_input(format!(
                "unknown project status '{other}'"
            ))),
        }
    }
}

/// A canonical stakeholder identity (homeowner, project manager, contractor, ...)
///
/// Contacts are referenced, never owned, by action records and messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Unique contact ID
    pub id: Uuid,
    /// Owning company
    pub company_id: Uuid,
    /// Project this contact is linked to (None for company-wide contacts)
    pub project_id: Option<Uuid>,
    /// Full display name
    pub name: String,
    /// Free-text role as entered in the CRM ("PM", "Homeowner", ...)
    pub role: Option<String>,
    /// Email channel
    pub email: Option<String>,
    /// Phone channel
    pub phone: Option<String>,
}

/// Outcome status of one orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is still in progress
    Running,
    /// Terminal answer produced (including the iteration-cap diagnostic)
    Completed,
    /// Transport or unexpected top-level failure
    Failed,
    /// Loop-abort: repetition detected and the run was cut short
    Aborted,
}

impl RunStatus {
    /// String representation for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }

    /// Parse from the database representation
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for unknown status strings
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "aborted" => Ok(Self::Aborted),
            other => Err(AppError::invalid_input(format!(
                "unknown run status '{other}'"
            ))),
        }
    }
}

/// Token and cost accounting for one run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Tokens sent to the model across all iterations
    pub prompt_tokens: u64,
    /// Tokens generated by the model across all iterations
    pub completion_tokens: u64,
    /// Computed cost in USD
    pub cost_usd: f64,
}

impl RunMetrics {
    /// Total tokens in both directions
    #[must_use]
    pub const fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One end-to-end invocation of the orchestration loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    /// Unique run ID
    pub id: Uuid,
    /// Owning company
    pub company_id: Uuid,
    /// Project this run operated on
    pub project_id: Uuid,
    /// Run outcome
    pub status: RunStatus,
    /// Terminal natural-language answer (or failure diagnostic)
    pub final_answer: Option<String>,
    /// Model-endpoint iterations consumed
    pub iterations: u32,
    /// Token/cost accounting
    pub metrics: RunMetrics,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished (None while running)
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [RunStatus::Running, RunStatus::Completed, RunStatus::Failed, RunStatus::Aborted] {
            assert_eq!(RunStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(RunStatus::parse("bogus").is_err());
    }

    #[test]
    fn test_metrics_total() {
        let metrics = RunMetrics {
            prompt_tokens: 120,
            completion_tokens: 30,
            cost_usd: 0.0,
        };
        assert_eq!(metrics.total_tokens(), 150);
    }
}
