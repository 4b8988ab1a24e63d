// ABOUTME: Database operations for projects with company-scoped access
// ABOUTME: Project CRUD and the next-check timestamp mutation used by reminder actions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_uuid;
use crate::errors::{AppError, AppResult};
use crate::models::{Project, ProjectStatus};

/// Project database operations manager
pub struct ProjectManager {
    pool: SqlitePool,
}

impl ProjectManager {
    /// Create a new project manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new project
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(&self, company_id: Uuid, name: &str) -> AppResult<Project> {
        let project = Project {
            id: Uuid::new_v4(),
            company_id,
            name: name.to_owned(),
            status: ProjectStatus::Active,
            next_check_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO projects (id, company_id, name, status, next_check_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(project.id.to_string())
        .bind(project.company_id.to_string())
        .bind(&project.name)
        .bind(project.status.as_str())
        .bind(project.next_check_at)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create project: {e}")))?;

        Ok(project)
    }

    /// Get a project by id with company isolation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, project_id: Uuid, company_id: Uuid) -> AppResult<Option<Project>> {
        let row = sqlx::query(
            r"
            SELECT id, company_id, name, status, next_check_at, created_at, updated_at
            FROM projects
            WHERE id = $1 AND company_id = $2
            ",
        )
        .bind(project_id.to_string())
        .bind(company_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get project: {e}")))?;

        row.map(|r| {
            Ok(Project {
                id: parse_uuid(&r.get::<String, _>("id"), "id")?,
                company_id: parse_uuid(&r.get::<String, _>("company_id"), "company_id")?,
                name: r.get("name"),
                status: ProjectStatus::parse(&r.get::<String, _>("status"))?,
                next_check_at: r.get("next_check_at"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            })
        })
        .transpose()
    }

    /// Advance a project's next-check timestamp
    ///
    /// Returns `false` when the project does not exist in the company scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_next_check(
        &self,
        project_id: Uuid,
        company_id: Uuid,
        next_check_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE projects
            SET next_check_at = $1, updated_at = $2
            WHERE id = $3 AND company_id = $4
            ",
        )
        .bind(next_check_at)
        .bind(Utc::now())
        .bind(project_id.to_string())
        .bind(company_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update next check: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
