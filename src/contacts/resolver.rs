// ABOUTME: Fuzzy contact resolver implementing the ordered matcher cascade
// ABOUTME: Exact name, role alias, partial name/role, unscoped search, then email match
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Contact Resolver
//!
//! Resolution runs an ordered list of matcher strategies, short-circuited by
//! the first hit:
//!
//! 1. Exact case-insensitive full-name match among project contacts
//! 2. Exact canonical role match (alias table: "PM" == "Project Manager")
//! 3. Partial/substring name match, either direction
//! 4. Partial/substring role match
//! 5. Unscoped name-or-role substring search across all company contacts
//! 6. Exact email match when the query looks like an email address
//!
//! Resolution is deterministic: within a step, candidates are considered in
//! the stable name ordering the contact listings return.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::database::ContactManager;
use crate::errors::AppResult;
use crate::models::Contact;

/// In-memory matcher strategy over a candidate list
type Matcher = fn(&str, &[Contact]) -> Option<Uuid>;

/// Project-scoped matchers, in cascade order
const PROJECT_MATCHERS: &[(&str, Matcher)] = &[
    ("exact_name", exact_name_match),
    ("role_alias", role_alias_match),
    ("partial_name", partial_name_match),
    ("partial_role", partial_role_match),
];

/// Normalize a free-text role to its canonical form
///
/// Returns `None` for strings that match no known role vocabulary.
#[must_use]
pub fn canonical_role(raw: &str) -> Option<&'static str> {
    match normalize(raw).as_str() {
        "ho" | "homeowner" | "home owner" | "owner" => Some("homeowner"),
        "pm" | "project manager" | "bidlist project manager" => Some("project_manager"),
        "gc" | "general contractor" | "contractor" => Some("general_contractor"),
        "super" | "supervisor" | "site supervisor" => Some("site_supervisor"),
        "architect" | "designer" => Some("architect"),
        _ => None,
    }
}

/// Resolves free-text name/role strings to canonical contact ids
pub struct ContactResolver {
    contacts: ContactManager,
    company_id: Uuid,
}

impl ContactResolver {
    /// Create a resolver scoped to one company
    #[must_use]
    pub const fn new(pool: SqlitePool, company_id: Uuid) -> Self {
        Self {
            contacts: ContactManager::new(pool),
            company_id,
        }
    }

    /// Resolve a free-text name or role to a contact id
    ///
    /// Runs the matcher cascade; the first non-empty result wins. `None`
    /// means unresolved; callers must degrade gracefully (e.g., keep the
    /// raw string in the action payload).
    ///
    /// # Errors
    ///
    /// Returns an error only on database failure; a resolution miss is `Ok(None)`.
    pub async fn resolve(&self, query: &str, project_id: Uuid) -> AppResult<Option<Uuid>> {
        let query = normalize(query);
        if query.is_empty() {
            return Ok(None);
        }

        let project_contacts = self
            .contacts
            .list_for_project(project_id, self.company_id)
            .await?;

        for &(strategy, matcher) in PROJECT_MATCHERS {
            if let Some(contact_id) = matcher(&query, &project_contacts) {
                debug!(%contact_id, strategy, "Resolved contact");
                return Ok(Some(contact_id));
            }
        }

        // No project-scoped hit; widen to the whole company
        let company_contacts = self.contacts.list_for_company(self.company_id).await?;
        if let Some(contact_id) = unscoped_match(&query, &company_contacts) {
            debug!(%contact_id, strategy = "unscoped", "Resolved contact");
            return Ok(Some(contact_id));
        }

        if query.contains('@') {
            if let Some(contact_id) = email_match(&query, &company_contacts) {
                debug!(%contact_id, strategy = "email", "Resolved contact");
                return Ok(Some(contact_id));
            }
        }

        debug!(query = %query, "Contact resolution missed");
        Ok(None)
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn exact_name_match(query: &str, contacts: &[Contact]) -> Option<Uuid> {
    contacts
        .iter()
        .find(|c| normalize(&c.name) == query)
        .map(|c| c.id)
}

fn role_alias_match(query: &str, contacts: &[Contact]) -> Option<Uuid> {
    let wanted = canonical_role(query)?;
    contacts
        .iter()
        .find(|c| {
            c.role
                .as_deref()
                .and_then(canonical_role)
                .is_some_and(|role| role == wanted)
        })
        .map(|c| c.id)
}

fn partial_name_match(query: &str, contacts: &[Contact]) -> Option<Uuid> {
    contacts
        .iter()
        .find(|c| {
            let name = normalize(&c.name);
            name.contains(query) || query.contains(name.as_str())
        })
        .map(|c| c.id)
}

fn partial_role_match(query: &str, contacts: &[Contact]) -> Option<Uuid> {
    contacts
        .iter()
        .find(|c| {
            c.role.as_deref().is_some_and(|role| {
                let role = normalize(role);
                !role.is_empty() && (role.contains(query) || query.contains(role.as_str()))
            })
        })
        .map(|c| c.id)
}

fn unscoped_match(query: &str, contacts: &[Contact]) -> Option<Uuid> {
    contacts
        .iter()
        .find(|c| {
            normalize(&c.name).contains(query)
                || c.role
                    .as_deref()
                    .is_some_and(|role| normalize(role).contains(query))
        })
        .map(|c| c.id)
}

fn email_match(query: &str, contacts: &[Contact]) -> Option<Uuid> {
    contacts
        .iter()
        .find(|c| {
            c.email
                .as_deref()
                .is_some_and(|email| normalize(email) == query)
        })
        .map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, role: Option<&str>, email: Option<&str>) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            project_id: Some(Uuid::new_v4()),
            name: name.to_owned(),
            role: role.map(ToOwned::to_owned),
            email: email.map(ToOwned::to_owned),
            phone: None,
        }
    }

    #[test]
    fn test_role_aliases_normalize() {
        assert_eq!(canonical_role("PM"), Some("project_manager"));
        assert_eq!(canonical_role("Project Manager"), Some("project_manager"));
        assert_eq!(
            canonical_role("BidList Project Manager"),
            Some("project_manager")
        );
        assert_eq!(canonical_role("HO"), Some("homeowner"));
        assert_eq!(canonical_role("xyz"), None);
    }

    #[test]
    fn test_exact_name_beats_role() {
        let contacts = vec![contact("Jane Doe", Some("HO"), None), contact("Bob", Some("PM"), None)];
        let jane = contacts[0].id;
        assert_eq!(exact_name_match("jane doe", &contacts), Some(jane));
    }

    #[test]
    fn test_role_alias_match_finds_pm() {
        let contacts = vec![contact("Jane Doe", Some("HO"), None), contact("Bob", Some("PM"), None)];
        let bob = contacts[1].id;
        assert_eq!(role_alias_match("pm", &contacts), Some(bob));
    }

    #[test]
    fn test_partial_name_matches_both_directions() {
        let contacts = vec![contact("Jane Doe", None, None)];
        let jane = contacts[0].id;
        assert_eq!(partial_name_match("jane", &contacts), Some(jane));
        assert_eq!(partial_name_match("mrs jane doe sr", &contacts), Some(jane));
    }

    #[test]
    fn test_email_match_is_exact() {
        let contacts = vec![contact("Jane Doe", None, Some("jane@example.com"))];
        let jane = contacts[0].id;
        assert_eq!(email_match("jane@example.com", &contacts), Some(jane));
        assert_eq!(email_match("jane@else.com", &contacts), None);
    }
}
