// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Provides the Beacon project steward system prompt for tool calling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy
//! maintenance. Prompt *content* is not part of the orchestration contract;
//! callers may substitute their own.

/// Beacon project steward system prompt
///
/// Contains instructions for the agent including:
/// - Role and communication style
/// - Available tools and when to use them
/// - Approval-gating expectations for side effects
pub const BEACON_SYSTEM_PROMPT: &str = include_str!("beacon_system.md");

/// Get the default system prompt for the Beacon project steward
#[must_use]
pub const fn get_beacon_system_prompt() -> &'static str {
    BEACON_SYSTEM_PROMPT
}
