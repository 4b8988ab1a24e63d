// ABOUTME: Database operations for contacts with company-scoped access
// ABOUTME: Contact creation and the project/company listings consumed by the resolver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{parse_uuid, parse_uuid_opt};
use crate::errors::{AppError, AppResult};
use crate::models::Contact;

/// Parameters for creating a contact
#[derive(Debug, Clone)]
pub struct NewContact {
    /// Owning company
    pub company_id: Uuid,
    /// Project linkage (None for company-wide contacts)
    pub project_id: Option<Uuid>,
    /// Full display name
    pub name: String,
    /// Free-text role as entered in the CRM
    pub role: Option<String>,
    /// Email channel
    pub email: Option<String>,
    /// Phone channel
    pub phone: Option<String>,
}

/// Contact database operations manager
pub struct ContactManager {
    pool: SqlitePool,
}

impl ContactManager {
    /// Create a new contact manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new contact
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(&self, new: NewContact) -> AppResult<Contact> {
        let contact = Contact {
            id: Uuid::new_v4(),
            company_id: new.company_id,
            project_id: new.project_id,
            name: new.name,
            role: new.role,
            email: new.email,
            phone: new.phone,
        };

        sqlx::query(
            r"
            INSERT INTO contacts (id, company_id, project_id, name, role, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(contact.id.to_string())
        .bind(contact.company_id.to_string())
        .bind(contact.project_id.map(|id| id.to_string()))
        .bind(&contact.name)
        .bind(&contact.role)
        .bind(&contact.email)
        .bind(&contact.phone)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create contact: {e}")))?;

        Ok(contact)
    }

    /// Get a contact by id with company isolation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, contact_id: Uuid, company_id: Uuid) -> AppResult<Option<Contact>> {
        let row = sqlx::query(
            r"
            SELECT id, company_id, project_id, name, role, email, phone
            FROM contacts
            WHERE id = $1 AND company_id = $2
            ",
        )
        .bind(contact_id.to_string())
        .bind(company_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get contact: {e}")))?;

        row.map(|r| row_to_contact(&r)).transpose()
    }

    /// List contacts linked to a project
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_for_project(
        &self,
        project_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Vec<Contact>> {
        let rows = sqlx::query(
            r"
            SELECT id, company_id, project_id, name, role, email, phone
            FROM contacts
            WHERE project_id = $1 AND company_id = $2
            ORDER BY name
            ",
        )
        .bind(project_id.to_string())
        .bind(company_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list project contacts: {e}")))?;

        rows.iter().map(row_to_contact).collect()
    }

    /// List every contact in a company (used by the unscoped resolver pass)
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_for_company(&self, company_id: Uuid) -> AppResult<Vec<Contact>> {
        let rows = sqlx::query(
            r"
            SELECT id, company_id, project_id, name, role, email, phone
            FROM contacts
            WHERE company_id = $1
            ORDER BY name
            ",
        )
        .bind(company_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list company contacts: {e}")))?;

        rows.iter().map(row_to_contact).collect()
    }
}

fn row_to_contact(row: &SqliteRow) -> AppResult<Contact> {
    Ok(Contact {
        id: parse_uuid(&row.get::<String, _>("id"), "id")?,
        company_id: parse_uuid(&row.get::<String, _>("company_id"), "company_id")?,
        project_id: parse_uuid_opt(
            row.get::<Option<String>, _>("project_id").as_deref(),
            "project_id",
        )?,
        name: row.get("name"),
        role: row.get("role"),
        email: row.get("email"),
        phone: row.get("phone"),
    })
}
