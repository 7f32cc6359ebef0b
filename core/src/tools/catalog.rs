//! Cached tool catalog

use crate::error::{Result, ToolError};
use crate::llm::{FunctionDefinition, ToolDefinition};
use crate::session::{ToolSession, ToolSpec};

use super::schema::validate_arguments;

/// The set of tools discovered from a session
///
/// Discovery runs once at connect time; the catalog is reused for every query
/// for the orchestrator's lifetime. Tool names are forwarded to the
/// completion backend exactly as discovered.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from already-discovered specs
    pub fn from_specs(specs: Vec<ToolSpec>) -> Self {
        Self { specs }
    }

    /// Discover the session's tools
    pub async fn refresh(session: &dyn ToolSession) -> Result<Self> {
        let specs = session.list_tools().await?;
        tracing::info!(count = specs.len(), "discovered tools");
        for spec in &specs {
            tracing::debug!(name = %spec.name, description = %spec.description, "tool");
        }
        Ok(Self { specs })
    }

    /// The raw discovered specs
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Look up a spec by name
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Translate the catalog into function declarations for the completion
    /// backend. A structural re-encoding only; a spec whose parameter schema
    /// is not a JSON object, or a name declared twice, is an error, never a
    /// silent drop.
    pub fn to_definitions(&self) -> Result<Vec<ToolDefinition>> {
        let mut seen = std::collections::HashSet::new();
        let mut definitions = Vec::with_capacity(self.specs.len());

        for spec in &self.specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(ToolError::Schema {
                    message: format!("duplicate tool name '{}' in catalog", spec.name),
                }
                .into());
            }
            if !spec.input_schema.is_object() {
                return Err(ToolError::Schema {
                    message: format!("tool '{}' has a non-object parameter schema", spec.name),
                }
                .into());
            }
            definitions.push(ToolDefinition {
                tool_type: "function".to_string(),
                function: FunctionDefinition {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    parameters: spec.input_schema.clone(),
                },
            });
        }

        Ok(definitions)
    }

    /// Validate model-supplied arguments for a named tool against its
    /// declared schema, before they reach the session.
    pub fn validate_call(&self, name: &str, arguments: &serde_json::Value) -> Result<()> {
        let spec = self.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })?;
        validate_arguments(&spec.name, &spec.input_schema, arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_details_spec() -> ToolSpec {
        serde_json::from_value(json!({
            "name": "get_user_details",
            "description": "Retrieve user details by username",
            "inputSchema": {
                "type": "object",
                "properties": { "username": { "type": "string" } },
                "required": ["username"]
            }
        }))
        .unwrap()
    }

    #[test]
    fn to_definitions_preserves_names_and_schemas() {
        let catalog = ToolCatalog::from_specs(vec![user_details_spec()]);
        let defs = catalog.to_definitions().unwrap();

        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].tool_type, "function");
        assert_eq!(defs[0].function.name, "get_user_details");
        assert_eq!(
            defs[0].function.parameters,
            user_details_spec().input_schema
        );
    }

    #[test]
    fn to_definitions_rejects_non_object_schema() {
        let spec: ToolSpec = serde_json::from_value(json!({
            "name": "broken",
            "inputSchema": "not a schema"
        }))
        .unwrap();
        let catalog = ToolCatalog::from_specs(vec![spec]);

        let err = catalog.to_definitions().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Tool(ToolError::Schema { .. })
        ));
    }

    #[test]
    fn to_definitions_rejects_duplicate_names() {
        let catalog =
            ToolCatalog::from_specs(vec![user_details_spec(), user_details_spec()]);

        let err = catalog.to_definitions().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Tool(ToolError::Schema { .. })
        ));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn validate_call_rejects_unknown_tool() {
        let catalog = ToolCatalog::from_specs(vec![user_details_spec()]);
        let err = catalog
            .validate_call("no_such_tool", &json!({}))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Tool(ToolError::NotFound { .. })
        ));
    }

    #[test]
    fn validate_call_accepts_valid_arguments() {
        let catalog = ToolCatalog::from_specs(vec![user_details_spec()]);
        catalog
            .validate_call("get_user_details", &json!({ "username": "Ali" }))
            .unwrap();
    }
}
