// ABOUTME: Environment-only configuration for the Beacon agent runtime
// ABOUTME: Reads BEACON_* variables with sensible defaults for local development
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Beacon Project Intelligence

//! # Configuration
//!
//! Environment-only configuration approach: every knob is a `BEACON_*`
//! environment variable with a default that works for local development.
//! There is no configuration file.

use std::env;

use crate::errors::{AppError, AppResult};

/// Environment variable for the SQLite database URL
pub const DATABASE_URL_ENV: &str = "BEACON_DATABASE_URL";

/// Environment variable for the model endpoint base URL
pub const LLM_BASE_URL_ENV: &str = "BEACON_LLM_BASE_URL";

/// Environment variable for the model endpoint API key (optional for local servers)
pub const LLM_API_KEY_ENV: &str = "BEACON_LLM_API_KEY";

/// Environment variable for the default model
pub const LLM_MODEL_ENV: &str = "BEACON_LLM_MODEL";

/// Environment variable for the orchestration iteration cap
pub const MAX_ITERATIONS_ENV: &str = "BEACON_MAX_ITERATIONS";

/// Environment variable for the transport request-per-minute window cap
pub const REQUESTS_PER_MINUTE_ENV: &str = "BEACON_REQUESTS_PER_MINUTE";

/// Environment variable for the transport in-flight cap
pub const MAX_IN_FLIGHT_ENV: &str = "BEACON_MAX_IN_FLIGHT";

/// Environment variable for the transport retry ceiling
pub const MAX_RETRIES_ENV: &str = "BEACON_MAX_RETRIES";

const DEFAULT_DATABASE_URL: &str = "sqlite:beacon.db";
const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_LLM_MODEL: &str = "qwen2.5:14b-instruct";
const DEFAULT_MAX_ITERATIONS: u32 = 5;
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;
const DEFAULT_MAX_IN_FLIGHT: usize = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Model endpoint configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,
    /// API key (None for unauthenticated local servers)
    pub api_key: Option<String>,
    /// Default model identifier
    pub model: String,
}

/// Full agent runtime configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// SQLite database URL
    pub database_url: String,
    /// Model endpoint settings
    pub llm: LlmConfig,
    /// Orchestration loop iteration cap
    pub max_iterations: u32,
    /// Sliding-window request cap per 60 seconds
    pub requests_per_minute: u32,
    /// Maximum concurrent in-flight model calls
    pub max_in_flight: usize,
    /// Retry ceiling for provider rate-limit errors
    pub max_retries: u32,
}

impl AgentConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a numeric variable is set but unparseable.
    pub fn from_env() -> AppResult<Self> {
        let database_url =
            env::var(DATABASE_URL_ENV).unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());
        let base_url =
            env::var(LLM_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_owned());
        let model = env::var(LLM_MODEL_ENV).unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_owned());
        let api_key = env::var(LLM_API_KEY_ENV).ok().filter(|k| !k.is_empty());

        Ok(Self {
            database_url,
            llm: LlmConfig {
                base_url,
                api_key,
                model,
            },
            max_iterations: parse_env(MAX_ITERATIONS_ENV, DEFAULT_MAX_ITERATIONS)?,
            requests_per_minute: parse_env(REQUESTS_PER_MINUTE_ENV, DEFAULT_REQUESTS_PER_MINUTE)?,
            max_in_flight: parse_env(MAX_IN_FLIGHT_ENV, DEFAULT_MAX_IN_FLIGHT)?,
            max_retries: parse_env(MAX_RETRIES_ENV, DEFAULT_MAX_RETRIES)?,
        })
    }
}

/// Parse a numeric environment variable, falling back to a default when unset
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("invalid value for {name}: '{raw}'"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_when_unset() {
        std::env::remove_var(MAX_ITERATIONS_ENV);
        std::env::remove_var(REQUESTS_PER_MINUTE_ENV);
        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.requests_per_minute, 60);
        assert_eq!(config.max_in_flight, 10);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    #[serial]
    fn test_invalid_numeric_value_is_config_error() {
        std::env::set_var(MAX_ITERATIONS_ENV, "not-a-number");
        let result = AgentConfig::from_env();
        std::env::remove_var(MAX_ITERATIONS_ENV);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_override_from_env() {
        std::env::set_var(MAX_ITERATIONS_ENV, "8");
        let config = AgentConfig::from_env().unwrap();
        std::env::remove_var(MAX_ITERATIONS_ENV);
        assert_eq!(config.max_iterations, 8);
    }
}
