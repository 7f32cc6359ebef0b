//! Completion client trait and response structures

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use crate::error::Result;

/// Trait for completion backends
///
/// Stateless adapter around the model service: given a message history and
/// the available tool declarations, it returns either a direct answer or a
/// set of requested tool invocations.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a chat completion request
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AssistantTurn>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// One assistant-generated turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantTurn {
    /// Text content, if the model produced any
    pub content: Option<String>,

    /// Requested tool invocations, in the order the model emitted them
    pub tool_calls: Vec<ToolCallRequest>,

    /// Usage statistics, if the backend reported them
    pub usage: Option<Usage>,
}

impl AssistantTurn {
    /// Convert this turn into a conversation message
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::assistant(self.content, self.tool_calls)
    }
}

/// A tool invocation requested by the completion backend
///
/// Ids are unique only within their own assistant turn; nothing may assume
/// global uniqueness across concurrent queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifier assigned by the backend, echoed back in the tool message
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Structured arguments, to be validated against the declared schema
    pub arguments: serde_json::Value,
}

/// Tool choice strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to call tools
    Auto,

    /// The model must not call tools; the orchestrator relies on this to
    /// guarantee termination of the final round
    None,
}

/// Usage statistics for a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,

    /// Number of tokens in the completion
    pub completion_tokens: u32,

    /// Total number of tokens
    pub total_tokens: u32,
}

/// Tool definition for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition
    pub function: FunctionDefinition,
}

/// Function definition for tool calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,

    /// Description of what the function does
    pub description: String,

    /// JSON schema for the function parameters
    pub parameters: serde_json::Value,
}
