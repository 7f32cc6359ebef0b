//! Completion gateway: message types, client trait, and providers

pub mod client;
pub mod message;
pub mod providers;

pub use client::{
    AssistantTurn, CompletionClient, FunctionDefinition, ToolCallRequest, ToolChoice,
    ToolDefinition, Usage,
};
pub use message::{ChatMessage, MessageRole};
pub use providers::OpenAiClient;
