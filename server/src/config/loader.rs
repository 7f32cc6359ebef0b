//! Configuration loader for the Concierge server
//!
//! Single-source priority loading with flag overrides:
//! 1. --config file (highest priority)
//! 2. Current working directory: ./concierge.json
//! 3. XDG config: ~/.config/concierge/config.json

use anyhow::{anyhow, Context, Result};
use concierge_core::config::ModelParams;
use concierge_core::{LlmConfig, McpServerConfig, OrchestratorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1-2025-04-14";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Raw configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: String,
    /// Base URL (optional, OpenAI default if not specified)
    pub base_url: Option<String>,
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Model parameters (optional)
    #[serde(default = "default_params")]
    pub params: ModelParams,
    /// System prompt for the assistant (optional, core default if absent)
    pub system_prompt: Option<String>,
    /// Address the HTTP server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Tool-server process configuration
    pub mcp_server: McpServerConfig,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_params() -> ModelParams {
    // The deployment is deterministic by default
    ModelParams {
        max_tokens: Some(10_000),
        temperature: Some(0.0),
    }
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

/// Fully resolved server settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub llm: LlmConfig,
    pub orchestrator: OrchestratorConfig,
    pub mcp_server: McpServerConfig,
    pub listen_addr: String,
}

/// Server configuration loader
#[derive(Default)]
pub struct ConfigLoader {
    config_override: Option<PathBuf>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    listen_addr_override: Option<String>,
}

impl ConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file override
    pub fn with_config_override(mut self, path: Option<PathBuf>) -> Self {
        self.config_override = path;
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: Option<String>) -> Self {
        self.api_key_override = api_key;
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        self.base_url_override = base_url;
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: Option<String>) -> Self {
        self.model_override = model;
        self
    }

    /// Set listen address override
    pub fn with_listen_addr_override(mut self, listen_addr: Option<String>) -> Self {
        self.listen_addr_override = listen_addr;
        self
    }

    /// Load, apply overrides, and resolve configuration
    pub fn load(&self) -> Result<ServerSettings> {
        let mut raw = if let Some(path) = &self.config_override {
            Self::load_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        } else {
            self.search_and_load()?
        };

        if let Some(api_key) = &self.api_key_override {
            raw.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            raw.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            raw.model = model.clone();
        }
        if let Some(listen_addr) = &self.listen_addr_override {
            raw.listen_addr = listen_addr.clone();
        }

        resolve(raw)
    }

    fn search_and_load(&self) -> Result<RawConfig> {
        let cwd_path = Path::new("concierge.json");
        if cwd_path.exists() {
            return Self::load_file(cwd_path).context("failed to load ./concierge.json");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_path = config_dir.join("concierge").join("config.json");
            if xdg_path.exists() {
                return Self::load_file(&xdg_path)
                    .with_context(|| format!("failed to load {}", xdg_path.display()));
            }
        }

        Err(anyhow!(
            "no configuration found: pass --config, or create ./concierge.json \
             or ~/.config/concierge/config.json"
        ))
    }

    fn load_file(path: &Path) -> Result<RawConfig> {
        let contents = std::fs::read_to_string(path)?;
        let raw: RawConfig = serde_json::from_str(&contents)?;
        Ok(raw)
    }
}

/// Resolve a raw config into validated server settings
fn resolve(raw: RawConfig) -> Result<ServerSettings> {
    let api_key = resolve_api_key(&raw.api_key)?;

    let llm = LlmConfig::new(
        raw.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        api_key,
        raw.model,
    )
    .with_params(raw.params);
    llm.validate().map_err(|e| anyhow!("invalid LLM config: {}", e))?;

    let orchestrator = match raw.system_prompt {
        Some(prompt) => OrchestratorConfig::default().with_system_prompt(prompt),
        None => OrchestratorConfig::default(),
    };

    if raw.mcp_server.command.is_empty() {
        return Err(anyhow!("mcp_server.command must not be empty"));
    }

    Ok(ServerSettings {
        llm,
        orchestrator,
        mcp_server: raw.mcp_server,
        listen_addr: raw.listen_addr,
    })
}

/// Resolve an api_key value, following "env:VAR_NAME" indirection
fn resolve_api_key(value: &str) -> Result<String> {
    if let Some(var) = value.strip_prefix("env:") {
        return std::env::var(var)
            .with_context(|| format!("environment variable {} is not set", var));
    }
    if value.is_empty() {
        return Err(anyhow!("api_key must not be empty"));
    }
    Ok(value.to_string())
}
