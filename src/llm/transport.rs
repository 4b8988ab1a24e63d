// ABOUTME: Rate-limited transport wrapping an LlmProvider with window, concurrency, and retry bounds
// ABOUTME: Sliding 60-second request window, semaphore in-flight cap, exponential backoff with jitter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Rate-Limited Transport
//!
//! Serializes calls to the model endpoint under a sliding 60-second
//! request-count window and a concurrent in-flight cap, blocking callers
//! until a slot is free. Provider rate-limit errors are retried with
//! exponential backoff plus random jitter up to a fixed ceiling, then
//! surfaced to the caller.
//!
//! Multiple orchestration runs may share one transport instance; the window
//! and semaphore are the only shared mutable state.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::{ChatCompletion, ChatRequest, LlmProvider};
use crate::errors::{AppError, AppResult};

/// Length of the sliding request window
const WINDOW: Duration = Duration::from_secs(60);

/// Retry behavior for provider rate-limit errors
///
/// The delay is a pure function of the attempt count: `base * 2^(attempt-1)`
/// plus a uniform random jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts before surfacing the error
    pub max_retries: u32,
    /// Initial backoff delay
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Compute the backoff delay for a given attempt (1-based), jitter included
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(2_u32.pow(exponent));
        let jitter_ms = if self.max_jitter.is_zero() {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.max_jitter.as_millis() as u64)
        };
        backoff + Duration::from_millis(jitter_ms)
    }
}

/// Request-shaping limits for the transport
#[derive(Debug, Clone)]
pub struct TransportLimits {
    /// Requests allowed inside the sliding 60-second window
    pub requests_per_minute: u32,
    /// Maximum concurrent in-flight requests
    pub max_in_flight: usize,
}

impl Default for TransportLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            max_in_flight: 10,
        }
    }
}

/// Rate-limited wrapper around a model endpoint provider
pub struct RateLimitedTransport {
    provider: Arc<dyn LlmProvider>,
    limits: TransportLimits,
    retry: RetryPolicy,
    /// Start times of requests issued inside the current window
    window: Mutex<VecDeque<Instant>>,
    in_flight: Semaphore,
}

impl RateLimitedTransport {
    /// Create a transport with explicit limits and retry policy
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, limits: TransportLimits, retry: RetryPolicy) -> Self {
        let max_in_flight = limits.max_in_flight;
        Self {
            provider,
            limits,
            retry,
            window: Mutex::new(VecDeque::new()),
            in_flight: Semaphore::new(max_in_flight),
        }
    }

    /// Create a transport with default limits (60/min, 10 in flight, 3 retries)
    #[must_use]
    pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, TransportLimits::default(), RetryPolicy::default())
    }

    /// The wrapped provider's default model
    #[must_use]
    pub fn default_model(&self) -> &str {
        self.provider.default_model()
    }

    /// Perform a chat completion under the transport's bounds
    ///
    /// Blocks until both an in-flight slot and a window slot are available,
    /// then calls the provider, retrying rate-limit errors per the policy.
    ///
    /// # Errors
    ///
    /// Returns the provider's error once the retry ceiling is reached, or
    /// any non-retryable provider error immediately.
    pub async fn complete(&self, request: &ChatRequest) -> AppResult<ChatCompletion> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| AppError::internal("transport semaphore closed"))?;

        let mut attempt = 0u32;
        loop {
            self.wait_for_window_slot().await;

            match self.provider.complete(request).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_rate_limited() => {
                    attempt += 1;
                    if attempt > self.retry.max_retries {
                        warn!(
                            provider = self.provider.name(),
                            attempts = attempt,
                            "Provider rate limit persisted past retry ceiling"
                        );
                        return Err(e);
                    }
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Provider rate limit hit, backing off"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Block until the sliding window admits another request, then claim the slot
    async fn wait_for_window_slot(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                while window
                    .front()
                    .is_some_and(|&start| now.duration_since(start) >= WINDOW)
                {
                    window.pop_front();
                }

                if (window.len() as u32) < self.limits.requests_per_minute {
                    window.push_back(now);
                    None
                } else {
                    // Oldest entry decides when the next slot opens
                    window
                        .front()
                        .map(|&start| WINDOW.saturating_sub(now.duration_since(start)))
                }
            };

            match wait {
                None => return,
                Some(duration) => {
                    debug!(
                        wait_ms = duration.as_millis() as u64,
                        "Request window full, waiting for a slot"
                    );
                    sleep(duration.max(Duration::from_millis(10))).await;
                }
            }
        }
    }
}
