//! # Concierge Core
//!
//! Core library for Concierge - a tool-augmented conversation orchestrator.
//!
//! This library connects a conversational language model to externally hosted
//! tools reachable over a session-based protocol: it discovers the tools a
//! tool host offers, forwards their schemas to the model, dispatches the tool
//! invocations the model requests, and folds the results back into a final
//! completion call.

// Core modules
pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod session;
pub mod tools;

// Re-export commonly used types
pub use config::{LlmConfig, ModelParams, OrchestratorConfig};
pub use error::{Error, Result};
pub use llm::{AssistantTurn, ChatMessage, CompletionClient, ToolCallRequest, ToolChoice};
pub use orchestrator::Orchestrator;
pub use session::{ConnectionState, McpServerConfig, McpSession, ToolSession, ToolSpec};
pub use tools::ToolCatalog;

/// Current version of the concierge-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
