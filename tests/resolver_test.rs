// ABOUTME: Integration tests for the contact resolver's matcher cascade
// ABOUTME: Covers exact-name priority, role aliases, partials, unscoped search, and email match
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{create_test_pool, seed_project};

use beacon_agent::contacts::ContactResolver;
use beacon_agent::database::contacts::NewContact;
use beacon_agent::database::ContactManager;
use uuid::Uuid;

#[tokio::test]
async fn test_exact_name_beats_role_match() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;
    let resolver = ContactResolver::new(pool, fixture.company_id);

    // "jane doe" is both an exact name and a plausible partial; exact wins
    let resolved = resolver
        .resolve("jane doe", fixture.project_id)
        .await
        .unwrap();
    assert_eq!(resolved, Some(fixture.jane));
}

#[tokio::test]
async fn test_role_alias_resolves_pm_to_bob() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;
    let resolver = ContactResolver::new(pool, fixture.company_id);

    for query in ["pm", "PM", "Project Manager", "BidList Project Manager"] {
        let resolved = resolver.resolve(query, fixture.project_id).await.unwrap();
        assert_eq!(resolved, Some(fixture.bob), "query '{query}' should hit Bob");
    }
}

#[tokio::test]
async fn test_homeowner_alias_resolves_to_jane() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;
    let resolver = ContactResolver::new(pool, fixture.company_id);

    let resolved = resolver
        .resolve("Homeowner", fixture.project_id)
        .await
        .unwrap();
    assert_eq!(resolved, Some(fixture.jane));
}

#[tokio::test]
async fn test_unmatched_query_returns_none() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;
    let resolver = ContactResolver::new(pool, fixture.company_id);

    let resolved = resolver.resolve("xyz", fixture.project_id).await.unwrap();
    assert_eq!(resolved, None);
}

#[tokio::test]
async fn test_partial_name_matches() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;
    let resolver = ContactResolver::new(pool, fixture.company_id);

    let resolved = resolver.resolve("jane", fixture.project_id).await.unwrap();
    assert_eq!(resolved, Some(fixture.jane));
}

#[tokio::test]
async fn test_unscoped_search_finds_company_contact() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    // A company-wide contact not linked to the project
    let inspector = ContactManager::new(pool.clone())
        .create(NewContact {
            company_id: fixture.company_id,
            project_id: None,
            name: "Rita Vaughn".to_owned(),
            role: Some("Inspector".to_owned()),
            email: None,
            phone: None,
        })
        .await
        .unwrap();

    let resolver = ContactResolver::new(pool, fixture.company_id);
    let resolved = resolver.resolve("rita", fixture.project_id).await.unwrap();
    assert_eq!(resolved, Some(inspector.id));
}

#[tokio::test]
async fn test_email_lookup_is_exact() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;
    let resolver = ContactResolver::new(pool, fixture.company_id);

    let resolved = resolver
        .resolve("jane.doe@example.com", fixture.project_id)
        .await
        .unwrap();
    assert_eq!(resolved, Some(fixture.jane));

    let missed = resolver
        .resolve("nobody@example.com", fixture.project_id)
        .await
        .unwrap();
    assert_eq!(missed, None);
}

#[tokio::test]
async fn test_resolution_respects_company_scope() {
    let pool = create_test_pool().await;
    let fixture = seed_project(&pool).await;

    // A resolver scoped to a different company must not see these contacts
    let resolver = ContactResolver::new(pool, Uuid::new_v4());
    let resolved = resolver
        .resolve("jane doe", fixture.project_id)
        .await
        .unwrap();
    assert_eq!(resolved, None);
}
