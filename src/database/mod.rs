// ABOUTME: SQLite persistence layer with per-domain manager structs over a shared pool
// ABOUTME: Connection setup, idempotent schema migration, and shared row-decoding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Database Layer
//!
//! SQLite via `sqlx`, organized as one manager struct per domain area
//! (`ProjectManager`, `ContactManager`, `ActionRecordManager`, `RunManager`)
//! sharing a `SqlitePool`. All writes are single-row statements;
//! consistency is last-write-wins per row. Every project-scoped query
//! filters by `company_id`; the authorization boundary is enforced here,
//! not trusted from callers.

pub mod actions;
pub mod contacts;
pub mod projects;
pub mod runs;

pub use actions::ActionRecordManager;
pub use contacts::ContactManager;
pub use projects::ProjectManager;
pub use runs::RunManager;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Open a SQLite pool, creating the database file if missing
///
/// # Errors
///
/// Returns `AppError::DatabaseError` if the URL is invalid or the
/// connection cannot be established.
pub async fn connect(database_url: &str) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::database(format!("invalid database URL: {e}")))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create all tables and indexes if they do not exist
///
/// Safe to run on every startup.
///
/// # Errors
///
/// Returns `AppError::DatabaseError` on schema execution failure.
pub async fn migrate(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            next_check_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            project_id TEXT,
            name TEXT NOT NULL,
            role TEXT,
            email TEXT,
            phone TEXT
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS action_records (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            run_id TEXT,
            action_type TEXT NOT NULL,
            payload TEXT NOT NULL,
            requires_approval INTEGER NOT NULL,
            status TEXT NOT NULL,
            recipient_contact_id TEXT,
            sender_contact_id TEXT,
            remind_at TEXT,
            dedupe_key TEXT NOT NULL,
            created_at TEXT NOT NULL,
            executed_at TEXT
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE INDEX IF NOT EXISTS idx_action_records_dedupe
        ON action_records (project_id, dedupe_key)
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS agent_runs (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            project_id TEXT NOT NULL,
            status TEXT NOT NULL,
            final_answer TEXT,
            iterations INTEGER NOT NULL DEFAULT 0,
            prompt_tokens INTEGER NOT NULL DEFAULT 0,
            completion_tokens INTEGER NOT NULL DEFAULT 0,
            cost_usd REAL NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL,
            finished_at TEXT
        )
        ",
    )
    .execute(pool)
    .await?;

    info!("Database schema is up to date");
    Ok(())
}

/// Decode a TEXT uuid column
pub(crate) fn parse_uuid(value: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::database(format!("invalid uuid in column '{column}': {e}")))
}

/// Decode an optional TEXT uuid column
pub(crate) fn parse_uuid_opt(value: Option<&str>, column: &str) -> AppResult<Option<Uuid>> {
    value.map(|v| parse_uuid(v, column)).transpose()
}
