//! Pre-dispatch validation of tool arguments
//!
//! Tool arguments arrive as free-form JSON constrained only by the declared
//! parameter schema. The checks here cover the object shape, required keys,
//! and primitive type tags; anything deeper is the tool server's problem.

use serde_json::Value;

use crate::error::{Result, ToolError};

/// Validate `arguments` against a tool's declared parameter schema.
///
/// Failures are [`ToolError::Invocation`] so the orchestration loop can fold
/// them into a tool-result message instead of failing the whole turn.
pub fn validate_arguments(tool_name: &str, schema: &Value, arguments: &Value) -> Result<()> {
    let invalid = |message: String| -> crate::Error {
        ToolError::Invocation {
            name: tool_name.to_string(),
            message,
        }
        .into()
    };

    let Some(schema_obj) = schema.as_object() else {
        // Non-object schemas are caught earlier at catalog translation
        return Ok(());
    };

    let Some(args_obj) = arguments.as_object() else {
        return Err(invalid(format!(
            "arguments must be an object, got {}",
            type_name(arguments)
        )));
    };

    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !args_obj.contains_key(key) {
                return Err(invalid(format!("missing required argument: {}", key)));
            }
        }
    }

    if let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) {
        for (key, value) in args_obj {
            let Some(declared) = properties.get(key) else {
                continue;
            };
            if let Some(expected) = declared.get("type").and_then(Value::as_str) {
                if !matches_type(value, expected) {
                    return Err(invalid(format!(
                        "argument '{}' should be {}, got {}",
                        key,
                        expected,
                        type_name(value)
                    )));
                }
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown type tag, let it through
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
