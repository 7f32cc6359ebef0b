//! Conversation message structures

use serde::{Deserialize, Serialize};

use super::client::ToolCallRequest;

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,

    /// User message (human input)
    User,

    /// Assistant message (model response)
    Assistant,

    /// Tool message (tool execution result)
    Tool,
}

/// One turn in a conversation
///
/// The conversation is an ordered sequence of these; order is semantically
/// significant and is replayed verbatim to the completion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Text content. Assistant turns that only request tools carry none.
    pub content: Option<String>,

    /// Tool invocations requested by an assistant turn, in request order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// For tool-role messages, the id of the originating tool call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a new system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a new tool-result message correlated to a tool call
    pub fn tool<S: Into<String>>(tool_call_id: S, content: S) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Whether this message requests any tool invocations
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
