//! OpenAI-compatible client implementation using the async-openai library

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
        ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessage,
        ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::LlmConfig;
use crate::error::{Error, LlmError, Result};
use crate::llm::{
    AssistantTurn, ChatMessage, CompletionClient, MessageRole, ToolCallRequest, ToolChoice,
    ToolDefinition, Usage,
};

/// OpenAI-compatible completion client
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout: std::time::Duration,
}

impl OpenAiClient {
    /// Create a new client from a resolved LLM config
    pub fn new(config: &LlmConfig) -> Result<Self> {
        config.validate()?;

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if config.base_url != "https://api.openai.com/v1" {
            openai_config = openai_config.with_api_base(&config.base_url);
        }

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            max_tokens: config.params.max_tokens,
            temperature: config.params.temperature,
            timeout: config.timeout(),
        })
    }

    /// Convert conversation messages to the async-openai request format
    fn convert_messages(&self, messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut converted = Vec::with_capacity(messages.len());

        for message in messages {
            match message.role {
                MessageRole::System => {
                    converted.push(ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessage {
                            content: message.content.clone().unwrap_or_default().into(),
                            name: None,
                        },
                    ));
                }
                MessageRole::User => {
                    converted.push(ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage {
                            content: message.content.clone().unwrap_or_default().into(),
                            name: None,
                        },
                    ));
                }
                MessageRole::Assistant => {
                    let tool_calls: Vec<ChatCompletionMessageToolCall> = message
                        .tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: async_openai::types::FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        })
                        .collect();

                    converted.push(ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: message
                                .content
                                .clone()
                                .map(ChatCompletionRequestAssistantMessageContent::Text),
                            name: None,
                            tool_calls: if tool_calls.is_empty() {
                                None
                            } else {
                                Some(tool_calls)
                            },
                            audio: None,
                            refusal: None,
                            ..Default::default()
                        },
                    ));
                }
                MessageRole::Tool => {
                    let tool_call_id = message.tool_call_id.clone().ok_or_else(|| {
                        Error::Llm(LlmError::InvalidRequest {
                            message: "Tool message missing tool_call_id".to_string(),
                        })
                    })?;

                    converted.push(ChatCompletionRequestMessage::Tool(
                        ChatCompletionRequestToolMessage {
                            content: ChatCompletionRequestToolMessageContent::Text(
                                message.content.clone().unwrap_or_default(),
                            ),
                            tool_call_id,
                        },
                    ));
                }
            }
        }

        Ok(converted)
    }

    /// Convert tool definitions to the async-openai format
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<ChatCompletionTool> {
        tools
            .iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.function.name.clone(),
                    description: Some(tool.function.description.clone()),
                    parameters: Some(tool.function.parameters.clone()),
                    strict: None,
                },
            })
            .collect()
    }

    /// Convert the async-openai response to an assistant turn
    fn convert_response(
        &self,
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> Result<AssistantTurn> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidRequest {
                message: "No choices in response".to_string(),
            })?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tool_call| {
                let function = tool_call.function;
                let arguments: Value = serde_json::from_str(&function.arguments)
                    .unwrap_or_else(|_| Value::String(function.arguments.clone()));

                ToolCallRequest {
                    id: tool_call.id,
                    name: function.name,
                    arguments,
                }
            })
            .collect();

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(AssistantTurn {
            content: choice.message.content,
            tool_calls,
            usage,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<AssistantTurn> {
        let converted_messages = self.convert_messages(messages)?;

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(converted_messages);

        // tool_choice without tools is rejected by the API
        if !tools.is_empty() {
            request_builder.tools(self.convert_tools(tools));
            request_builder.tool_choice(match tool_choice {
                ToolChoice::Auto => ChatCompletionToolChoiceOption::Auto,
                ToolChoice::None => ChatCompletionToolChoiceOption::None,
            });
            tracing::debug!(
                tool_count = tools.len(),
                ?tool_choice,
                "completion request with tools"
            );
        }

        if let Some(max_tokens) = self.max_tokens {
            request_builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request_builder.temperature(temperature);
        }

        let request = request_builder.build().map_err(|e| {
            Error::Llm(LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            })
        })?;

        // The underlying HTTP client carries no request timeout of its own;
        // a hung backend must surface as unavailable, not stall the query
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                Error::Llm(LlmError::Unavailable {
                    message: format!("completion request timed out after {:?}", self.timeout),
                })
            })?
            .map_err(map_openai_error)?;

        let turn = self.convert_response(response)?;
        if !turn.tool_calls.is_empty() {
            for call in &turn.tool_calls {
                tracing::debug!(name = %call.name, id = %call.id, "model requested tool call");
            }
        }

        Ok(turn)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

/// Map async-openai errors onto the backend error taxonomy
fn map_openai_error(err: OpenAIError) -> Error {
    match err {
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.as_deref().unwrap_or("");
            if kind.contains("rate_limit") {
                Error::Llm(LlmError::RateLimit)
            } else if kind.contains("invalid_request") {
                Error::Llm(LlmError::InvalidRequest {
                    message: api.message,
                })
            } else {
                // async-openai does not expose HTTP status codes directly
                Error::Llm(LlmError::Api {
                    status: 500,
                    message: api.message,
                })
            }
        }
        OpenAIError::Reqwest(e) => Error::Llm(LlmError::Unavailable {
            message: e.to_string(),
        }),
        other => Error::Llm(LlmError::Api {
            status: 500,
            message: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn hung_backend_surfaces_as_unavailable() {
        // Accepts connections and reads the request but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    while socket.read(&mut buf).await.unwrap_or(0) > 0 {}
                });
            }
        });

        let config = LlmConfig::new(format!("http://{}", addr), "sk-test", "gpt-4o")
            .with_timeout_seconds(1);
        let client = OpenAiClient::new(&config).unwrap();

        let err = client
            .complete(&[ChatMessage::user("hello")], &[], ToolChoice::Auto)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Llm(LlmError::Unavailable { .. })));
    }
}
