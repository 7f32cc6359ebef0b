//! Configuration types for Concierge core

mod types;

pub use types::{LlmConfig, ModelParams, OrchestratorConfig, DEFAULT_SYSTEM_PROMPT};
