//! Error types and handling for Concierge Core

use thiserror::Error;

/// Result type alias for Concierge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Concierge Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Tool-level errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Completion backend errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// Transport session errors
///
/// These indicate the channel to the tool host itself is unusable and abort
/// the current query; per-tool failures live in [`ToolError`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Session not connected")]
    NotConnected,

    #[error("Session closed")]
    Closed,

    #[error("Transport failure: {message}")]
    Transport { message: String },
}

/// Tool-level errors
///
/// Recovered inside the orchestration loop by encoding the failure as the
/// tool message's content, so a single failing tool does not fail the query.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Tool invocation failed: {name} - {message}")]
    Invocation { name: String, message: String },

    #[error("Malformed tool schema: {message}")]
    Schema { message: String },
}

/// Completion backend errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl Error {
    /// Whether this error is recoverable inside the orchestration loop by
    /// folding it into a tool-result message. Transport and backend errors
    /// are not; they terminate the query.
    pub fn is_tool_recoverable(&self) -> bool {
        matches!(self, Error::Tool(_))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
