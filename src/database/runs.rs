// ABOUTME: Database operations for agent run records and their metrics
// ABOUTME: Start/finish lifecycle writes used by the orchestration loop on every exit path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::parse_uuid;
use crate::errors::{AppError, AppResult};
use crate::models::{AgentRun, RunMetrics, RunStatus};

/// Agent run database operations manager
pub struct RunManager {
    pool: SqlitePool,
}

impl RunManager {
    /// Create a new run manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new run in the `running` state
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn start(&self, company_id: Uuid, project_id: Uuid) -> AppResult<AgentRun> {
        let run = AgentRun {
            id: Uuid::new_v4(),
            company_id,
            project_id,
            status: RunStatus::Running,
            final_answer: None,
            iterations: 0,
            metrics: RunMetrics::default(),
            started_at: Utc::now(),
            finished_at: None,
        };

        sqlx::query(
            r"
            INSERT INTO agent_runs (
                id, company_id, project_id, status, final_answer, iterations,
                prompt_tokens, completion_tokens, cost_usd, started_at, finished_at
            )
            VALUES ($1, $2, $3, $4, NULL, 0, 0, 0, 0, $5, NULL)
            ",
        )
        .bind(run.id.to_string())
        .bind(run.company_id.to_string())
        .bind(run.project_id.to_string())
        .bind(run.status.as_str())
        .bind(run.started_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to start run: {e}")))?;

        Ok(run)
    }

    /// Record a run's terminal state, answer, and metrics
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn finish(
        &self,
        run_id: Uuid,
        company_id: Uuid,
        status: RunStatus,
        final_answer: &str,
        iterations: u32,
        metrics: &RunMetrics,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE agent_runs
            SET status = $1, final_answer = $2, iterations = $3,
                prompt_tokens = $4, completion_tokens = $5, cost_usd = $6,
                finished_at = $7
            WHERE id = $8 AND company_id = $9
            ",
        )
        .bind(status.as_str())
        .bind(final_answer)
        .bind(i64::from(iterations))
        .bind(i64::try_from(metrics.prompt_tokens).unwrap_or(i64::MAX))
        .bind(i64::try_from(metrics.completion_tokens).unwrap_or(i64::MAX))
        .bind(metrics.cost_usd)
        .bind(Utc::now())
        .bind(run_id.to_string())
        .bind(company_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to finish run: {e}")))?;

        Ok(())
    }

    /// Get a run by id with company isolation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, run_id: Uuid, company_id: Uuid) -> AppResult<Option<AgentRun>> {
        let row = sqlx::query(
            r"
            SELECT * FROM agent_runs
            WHERE id = $1 AND company_id = $2
            ",
        )
        .bind(run_id.to_string())
        .bind(company_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get run: {e}")))?;

        row.map(|r| row_to_run(&r)).transpose()
    }
}

fn row_to_run(row: &SqliteRow) -> AppResult<AgentRun> {
    let iterations: i64 = row.get("iterations");
    let prompt_tokens: i64 = row.get("prompt_tokens");
    let completion_tokens: i64 = row.get("completion_tokens");
    Ok(AgentRun {
        id: parse_uuid(&row.get::<String, _>("id"), "id")?,
        company_id: parse_uuid(&row.get::<String, _>("company_id"), "company_id")?,
        project_id: parse_uuid(&row.get::<String, _>("project_id"), "project_id")?,
        status: RunStatus::parse(&row.get::<String, _>("status"))?,
        final_answer: row.get("final_answer"),
        iterations: u32::try_from(iterations).unwrap_or(0),
        metrics: RunMetrics {
            prompt_tokens: u64::try_from(prompt_tokens).unwrap_or(0),
            completion_tokens: u64::try_from(completion_tokens).unwrap_or(0),
            cost_usd: row.get("cost_usd"),
        },
        started_at: row.get("started_at"),
        finished_at: row.get::<Option<DateTime<Utc>>, _>("finished_at"),
    })
}
