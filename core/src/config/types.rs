//! Minimal configuration types for Concierge core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in the server layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Default persona for the assistant. Deployments override this in config;
/// it is always passed explicitly, never implicitly omitted.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that can use tools to answer questions.";

/// Model parameters for completion requests
///
/// Fixed per-deployment configuration, not per-call: temperature 0.0 makes
/// generation fully deterministic, max_tokens is a hard cap on output length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
}

/// A fully resolved completion backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers for requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Bounded wait for a single completion request, in seconds. A hung
    /// backend surfaces as unavailable instead of stalling the query.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    120
}

impl LlmConfig {
    /// Create a new resolved LLM config
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            params: ModelParams::default(),
            headers: HashMap::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Add a header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set the completion request deadline
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Bounded wait for a single completion request
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "api_key".to_string(),
            }
            .into());
        }

        if self.model.is_empty() {
            return Err(ConfigError::MissingField {
                field: "model".to_string(),
            }
            .into());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
            }
            .into());
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_seconds".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(ConfigError::InvalidValue {
                    field: "params.temperature".to_string(),
                    value: temp.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Configuration for the orchestration loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// System prompt prepended to every conversation
    pub system_prompt: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Set a custom system prompt. An empty prompt is allowed but must be
    /// asked for explicitly.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_missing_api_key() {
        let config = LlmConfig::new("https://api.openai.com/v1", "", "gpt-4o");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let config = LlmConfig::new("api.openai.com", "sk-test", "gpt-4o");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = LlmConfig::new("https://api.openai.com/v1", "sk-test", "gpt-4o")
            .with_timeout_seconds(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let mut config = LlmConfig::new("https://api.openai.com/v1", "sk-test", "gpt-4o");
        config.params.temperature = Some(3.5);
        assert!(config.validate().is_err());

        config.params.temperature = Some(0.0);
        assert!(config.validate().is_ok());
    }
}
