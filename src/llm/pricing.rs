// ABOUTME: Per-model pricing table for converting token usage into USD run cost
// ABOUTME: Prefix-matched model rates with a zero-cost fallback for local models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! Model pricing for run-cost accounting.
//!
//! Rates are USD per million tokens. Unknown models (local inference) cost
//! nothing; the table only needs entries for metered cloud models.

use super::TokenUsage;

/// Pricing for a single model family
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    /// USD per million prompt tokens
    pub prompt_per_million: f64,
    /// USD per million completion tokens
    pub completion_per_million: f64,
}

/// Prefix-matched pricing table, most specific prefix first
const PRICING_TABLE: &[(&str, ModelPricing)] = &[
    (
        "gpt-4o-mini",
        ModelPricing {
            prompt_per_million: 0.15,
            completion_per_million: 0.60,
        },
    ),
    (
        "gpt-4o",
        ModelPricing {
            prompt_per_million: 2.50,
            completion_per_million: 10.00,
        },
    ),
    (
        "gpt-4.1-mini",
        ModelPricing {
            prompt_per_million: 0.40,
            completion_per_million: 1.60,
        },
    ),
    (
        "gpt-4.1",
        ModelPricing {
            prompt_per_million: 2.00,
            completion_per_million: 8.00,
        },
    ),
];

/// Look up pricing for a model, `None` for unmetered (local) models
#[must_use]
pub fn pricing_for(model: &str) -> Option<ModelPricing> {
    PRICING_TABLE
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, pricing)| *pricing)
}

/// Compute the USD cost of one completion
#[must_use]
pub fn cost_usd(model: &str, usage: &TokenUsage) -> f64 {
    pricing_for(model).map_or(0.0, |pricing| {
        f64::from(usage.prompt_tokens) / 1_000_000.0 * pricing.prompt_per_million
            + f64::from(usage.completion_tokens) / 1_000_000.0 * pricing.completion_per_million
    })
}
