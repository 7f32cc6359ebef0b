//! Query processing engine

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::error::Result;
use crate::llm::{ChatMessage, CompletionClient, ToolCallRequest, ToolChoice};
use crate::session::ToolSession;
use crate::tools::ToolCatalog;

/// The tool-augmented conversation orchestrator
///
/// Holds one injected session and one completion client; the tool catalog is
/// discovered once and cached. All conversation state lives inside a single
/// `process_query` call, nothing is retained across queries.
pub struct Orchestrator {
    session: Arc<dyn ToolSession>,
    llm: Arc<dyn CompletionClient>,
    catalog: ToolCatalog,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator over an already-discovered catalog
    pub fn new(
        session: Arc<dyn ToolSession>,
        llm: Arc<dyn CompletionClient>,
        catalog: ToolCatalog,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            session,
            llm,
            catalog,
            config,
        }
    }

    /// Create an orchestrator, discovering the tool catalog from the session
    pub async fn discover(
        session: Arc<dyn ToolSession>,
        llm: Arc<dyn CompletionClient>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let catalog = ToolCatalog::refresh(session.as_ref()).await?;
        Ok(Self::new(session, llm, catalog, config))
    }

    /// The cached tool catalog
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Process one user query to a final textual answer.
    ///
    /// Tool-level failures (unknown tool, schema violation, remote tool
    /// error) are folded into the tool-result message so the model can
    /// decide how to communicate them; transport and backend failures
    /// terminate the query.
    pub async fn process_query(&self, query: &str) -> Result<String> {
        let tool_definitions = self.catalog.to_definitions()?;

        let mut messages = vec![
            ChatMessage::system(&self.config.system_prompt),
            ChatMessage::user(query),
        ];

        let turn = self
            .llm
            .complete(&messages, &tool_definitions, ToolChoice::Auto)
            .await?;

        let tool_calls = turn.tool_calls.clone();
        let direct_answer = turn.content.clone();
        messages.push(turn.into_message());

        if tool_calls.is_empty() {
            tracing::debug!("no tool calls requested, returning direct answer");
            return Ok(direct_answer.unwrap_or_default());
        }

        // Dispatch sequentially, in request order: later results may be
        // ordering-sensitive for the model, and the session serializes
        // in-flight calls anyway.
        let mut seen_ids = HashSet::new();
        for call in &tool_calls {
            let content = if !seen_ids.insert(call.id.as_str()) {
                tracing::warn!(id = %call.id, name = %call.name, "duplicate tool call id in turn");
                format!(
                    "Error: duplicate tool call id '{}' in this turn; call not executed",
                    call.id
                )
            } else {
                match self.execute_call(call).await {
                    Ok(text) => text,
                    Err(e) if e.is_tool_recoverable() => {
                        tracing::warn!(name = %call.name, error = %e, "tool call failed");
                        format!("Error: {}", e)
                    }
                    Err(e) => return Err(e),
                }
            };

            messages.push(ChatMessage::tool(call.id.clone(), content));
        }

        // Final round with tool use disabled; this is what guarantees
        // termination after a single round.
        let final_turn = self
            .llm
            .complete(&messages, &tool_definitions, ToolChoice::None)
            .await?;

        if !final_turn.tool_calls.is_empty() {
            tracing::warn!(
                count = final_turn.tool_calls.len(),
                "backend returned tool calls despite tool_choice=none, ignoring"
            );
        }

        Ok(final_turn.content.unwrap_or_default())
    }

    async fn execute_call(&self, call: &ToolCallRequest) -> Result<String> {
        self.catalog.validate_call(&call.name, &call.arguments)?;
        self.session
            .call_tool(&call.name, call.arguments.clone())
            .await
    }
}
