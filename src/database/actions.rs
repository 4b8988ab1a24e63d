// ABOUTME: Database operations for action records with dedupe-on-create semantics
// ABOUTME: Persists the state machine and the reminder side effect on the owning project
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{parse_uuid, parse_uuid_opt, ProjectManager};
use crate::actions::{ActionRecord, ActionStatus, ActionType, DeliveryRequest, NewAction};
use crate::errors::{AppError, AppResult};

/// Action record database operations manager
pub struct ActionRecordManager {
    pool: SqlitePool,
}

impl ActionRecordManager {
    /// Create a new action record manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an action record, enforcing content-hash idempotence
    ///
    /// If a non-rejected record with the same dedupe key already exists for
    /// the project, that record is returned instead of inserting a
    /// duplicate. Reminder-type records also advance the owning project's
    /// next-check timestamp as a side effect of creation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(&self, new: NewAction) -> AppResult<ActionRecord> {
        let record = ActionRecord::create(new);

        if let Some(existing) = self
            .find_by_dedupe_key(record.project_id, record.company_id, &record.dedupe_key)
            .await?
        {
            debug!(
                action_id = %existing.id,
                action_type = existing.action_type.as_str(),
                "Deduplicated action creation against existing record"
            );
            return Ok(existing);
        }

        sqlx::query(
            r"
            INSERT INTO action_records (
                id, company_id, project_id, run_id, action_type, payload,
                requires_approval, status, recipient_contact_id, sender_contact_id,
                remind_at, dedupe_key, created_at, executed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.company_id.to_string())
        .bind(record.project_id.to_string())
        .bind(record.run_id.map(|id| id.to_string()))
        .bind(record.action_type.as_str())
        .bind(record.payload.to_string())
        .bind(record.requires_approval)
        .bind(record.status.as_str())
        .bind(record.recipient_contact_id.map(|id| id.to_string()))
        .bind(record.sender_contact_id.map(|id| id.to_string()))
        .bind(record.remind_at)
        .bind(&record.dedupe_key)
        .bind(record.created_at)
        .bind(record.executed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create action record: {e}")))?;

        if record.action_type == ActionType::SetFutureReminder {
            if let Some(remind_at) = record.remind_at {
                ProjectManager::new(self.pool.clone())
                    .update_next_check(record.project_id, record.company_id, remind_at)
                    .await?;
            }
        }

        Ok(record)
    }

    /// Get an action record by id with company isolation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, action_id: Uuid, company_id: Uuid) -> AppResult<Option<ActionRecord>> {
        let row = sqlx::query(
            r"
            SELECT * FROM action_records
            WHERE id = $1 AND company_id = $2
            ",
        )
        .bind(action_id.to_string())
        .bind(company_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get action record: {e}")))?;

        row.map(|r| row_to_record(&r)).transpose()
    }

    /// List action records created by one run, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_for_run(&self, run_id: Uuid, company_id: Uuid) -> AppResult<Vec<ActionRecord>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM action_records
            WHERE run_id = $1 AND company_id = $2
            ORDER BY created_at
            ",
        )
        .bind(run_id.to_string())
        .bind(company_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list run actions: {e}")))?;

        rows.iter().map(row_to_record).collect()
    }

    /// List a project's most recent action records
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_recent_for_project(
        &self,
        project_id: Uuid,
        company_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<ActionRecord>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM action_records
            WHERE project_id = $1 AND company_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            ",
        )
        .bind(project_id.to_string())
        .bind(company_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list project actions: {e}")))?;

        rows.iter().map(row_to_record).collect()
    }

    /// Approve a pending record (external operator input)
    ///
    /// Returns the updated record and, for message-type actions, the request
    /// for the delivery collaborator.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ResourceNotFound` if the record is missing, or
    /// `AppError::InvalidStateTransition` if it is not pending.
    pub async fn approve(
        &self,
        action_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<(ActionRecord, Option<DeliveryRequest>)> {
        let mut record = self
            .get(action_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("action record"))?;
        let delivery = record.approve()?;
        self.persist_status(&record).await?;
        Ok((record, delivery))
    }

    /// Reject a pending record (external operator input)
    ///
    /// # Errors
    ///
    /// Returns `AppError::ResourceNotFound` if the record is missing, or
    /// `AppError::InvalidStateTransition` if it is not pending.
    pub async fn reject(&self, action_id: Uuid, company_id: Uuid) -> AppResult<ActionRecord> {
        let mut record = self
            .get(action_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("action record"))?;
        record.reject()?;
        self.persist_status(&record).await?;
        Ok(record)
    }

    /// Record that an approved side effect has taken place
    ///
    /// # Errors
    ///
    /// Returns `AppError::ResourceNotFound` if the record is missing, or
    /// `AppError::InvalidStateTransition` if it is not approved.
    pub async fn mark_executed(&self, action_id: Uuid, company_id: Uuid) -> AppResult<ActionRecord> {
        let mut record = self
            .get(action_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("action record"))?;
        record.mark_executed()?;
        self.persist_status(&record).await?;
        Ok(record)
    }

    async fn find_by_dedupe_key(
        &self,
        project_id: Uuid,
        company_id: Uuid,
        dedupe_key: &str,
    ) -> AppResult<Option<ActionRecord>> {
        let row = sqlx::query(
            r"
            SELECT * FROM action_records
            WHERE project_id = $1 AND company_id = $2 AND dedupe_key = $3 AND status != 'rejected'
            LIMIT 1
            ",
        )
        .bind(project_id.to_string())
        .bind(company_id.to_string())
        .bind(dedupe_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check dedupe key: {e}")))?;

        row.map(|r| row_to_record(&r)).transpose()
    }

    async fn persist_status(&self, record: &ActionRecord) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE action_records
            SET status = $1, executed_at = $2
            WHERE id = $3 AND company_id = $4
            ",
        )
        .bind(record.status.as_str())
        .bind(record.executed_at)
        .bind(record.id.to_string())
        .bind(record.company_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update action status: {e}")))?;
        Ok(())
    }
}

fn row_to_record(row: &SqliteRow) -> AppResult<ActionRecord> {
    let payload_raw: String = row.get("payload");
    Ok(ActionRecord {
        id: parse_uuid(&row.get::<String, _>("id"), "id")?,
        company_id: parse_uuid(&row.get::<String, _>("company_id"), "company_id")?,
        project_id: parse_uuid(&row.get::<String, _>("project_id"), "project_id")?,
        run_id: parse_uuid_opt(row.get::<Option<String>, _>("run_id").as_deref(), "run_id")?,
        action_type: ActionType::parse(&row.get::<String, _>("action_type"))?,
        payload: serde_json::from_str(&payload_raw)
            .map_err(|e| AppError::database(format!("invalid action payload JSON: {e}")))?,
        requires_approval: row.get("requires_approval"),
        status: ActionStatus::parse(&row.get::<String, _>("status"))?,
        recipient_contact_id: parse_uuid_opt(
            row.get::<Option<String>, _>("recipient_contact_id").as_deref(),
            "recipient_contact_id",
        )?,
        sender_contact_id: parse_uuid_opt(
            row.get::<Option<String>, _>("sender_contact_id").as_deref(),
            "sender_contact_id",
        )?,
        remind_at: row.get::<Option<DateTime<Utc>>, _>("remind_at"),
        dedupe_key: row.get("dedupe_key"),
        created_at: row.get("created_at"),
        executed_at: row.get::<Option<DateTime<Utc>>, _>("executed_at"),
    })
}
