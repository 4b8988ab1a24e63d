// ABOUTME: Integration tests for the rate-limited transport's retry and limit behavior
// ABOUTME: Covers backoff retry on rate limits, retry ceiling, and non-retryable passthrough
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptStep, ScriptedProvider};

use beacon_agent::errors::ErrorCode;
use beacon_agent::llm::{
    ChatMessage, ChatRequest, RateLimitedTransport, RetryPolicy, TransportLimits,
};

fn request() -> ChatRequest {
    ChatRequest::new(vec![ChatMessage::user("ping")])
}

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(5),
        max_jitter: Duration::from_millis(2),
    }
}

#[tokio::test]
async fn test_rate_limit_retried_until_success() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::RateLimited,
        ScriptStep::RateLimited,
        ScriptStep::Text("pong".to_owned()),
    ]));
    let transport = RateLimitedTransport::new(
        provider.clone(),
        TransportLimits::default(),
        fast_retry(3),
    );

    let completion = transport.complete(&request()).await.unwrap();
    assert_eq!(completion.content.as_deref(), Some("pong"));
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_rate_limit_surfaces_after_retry_ceiling() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::RateLimited,
        ScriptStep::RateLimited,
        ScriptStep::RateLimited,
    ]));
    let transport = RateLimitedTransport::new(
        provider.clone(),
        TransportLimits::default(),
        fast_retry(2),
    );

    let err = transport.complete(&request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalRateLimited);
    // Initial attempt plus two retries
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_non_retryable_error_passes_through_immediately() {
    let provider = Arc::new(ScriptedProvider::new(vec![ScriptStep::Fail(
        "bad gateway".to_owned(),
    )]));
    let transport = RateLimitedTransport::new(
        provider.clone(),
        TransportLimits::default(),
        fast_retry(3),
    );

    let err = transport.complete(&request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_sequential_requests_within_window_do_not_block() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptStep::Text("one".to_owned()),
        ScriptStep::Text("two".to_owned()),
        ScriptStep::Text("three".to_owned()),
    ]));
    let transport = RateLimitedTransport::new(
        provider.clone(),
        TransportLimits::default(),
        fast_retry(0),
    );

    for expected in ["one", "two", "three"] {
        let completion = transport.complete(&request()).await.unwrap();
        assert_eq!(completion.content.as_deref(), Some(expected));
    }
    assert_eq!(provider.calls(), 3);
}
