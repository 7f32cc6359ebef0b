//! Transport session to the tool-hosting endpoint
//!
//! Owns one bidirectional channel to a tool host. The concrete transport is a
//! child process speaking line-delimited JSON-RPC over stdio; the seam is the
//! [`ToolSession`] trait so the orchestrator takes an injected session and
//! tests can substitute their own.

pub mod stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

pub use stdio::McpSession;

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// Immutable descriptor of a remote tool, as discovered from the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name, unique within a session
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// JSON schema describing accepted arguments
    #[serde(rename = "inputSchema", default = "default_input_schema")]
    pub input_schema: serde_json::Value,
}

fn default_input_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Configuration for spawning a tool-server process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Command and arguments to start the tool server
    pub command: Vec<String>,

    /// Environment variables for the tool server
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Bounded wait for a single session operation, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl McpServerConfig {
    /// Create a config for the given command line
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            env: HashMap::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Bounded wait for a single operation
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Trait for live sessions to a tool host
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Query the session for its tool catalog
    async fn list_tools(&self) -> Result<Vec<ToolSpec>>;

    /// Invoke a named tool with structured arguments, returning its text content
    async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<String>;

    /// Release the channel; safe to call multiple times
    async fn close(&self) -> Result<()>;
}
