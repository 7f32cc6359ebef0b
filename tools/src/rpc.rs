//! Line-delimited JSON-RPC 2.0 server loop
//!
//! Three methods: `initialize`, `tools/list`, and `tools/call`. One request
//! per line on stdin, one response per line on stdout; logging goes to
//! stderr so it never corrupts the protocol channel.

use anyhow::Result;
use serde_json::{json, Value};
use std::io::{BufRead, Write};

use crate::customers::CustomerDb;

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

const GET_USER_DETAILS_DESCRIPTION: &str =
    "Retrieve user details from the customer database by username. \
     Returns a formatted text block with the user's name, email, city, \
     birthdate, and balance, or an explanatory message if the user is not \
     found.";

/// Serve requests until EOF on the reader
pub fn serve(reader: impl BufRead, mut writer: impl Write, db: &CustomerDb) -> Result<()> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(request) => handle_request(&request, db),
            Err(e) => {
                tracing::warn!("malformed request line: {}", e);
                error_response(Value::Null, PARSE_ERROR, &format!("parse error: {}", e))
            }
        };

        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    tracing::info!("stdin closed, exiting");
    Ok(())
}

/// Dispatch one request to a response
pub fn handle_request(request: &Value, db: &CustomerDb) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    match method {
        "initialize" => result_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "concierge-tools",
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        ),
        "tools/list" => result_response(id, json!({ "tools": [tool_spec()] })),
        "tools/call" => handle_tool_call(id, request.get("params"), db),
        other => error_response(
            id,
            METHOD_NOT_FOUND,
            &format!("unknown method: {}", other),
        ),
    }
}

fn handle_tool_call(id: Value, params: Option<&Value>, db: &CustomerDb) -> Value {
    let Some(params) = params else {
        return error_response(id, INVALID_PARAMS, "missing params");
    };

    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    if name != "get_user_details" {
        return error_response(id, INVALID_PARAMS, &format!("unknown tool: {}", name));
    }

    let Some(username) = params
        .get("arguments")
        .and_then(|args| args.get("username"))
        .and_then(Value::as_str)
    else {
        return error_response(id, INVALID_PARAMS, "missing required argument: username");
    };

    tracing::debug!(username, "get_user_details");
    let text = db.get_user_details(username);

    result_response(
        id,
        json!({
            "content": [{ "type": "text", "text": text }],
            "isError": false,
        }),
    )
}

fn tool_spec() -> Value {
    json!({
        "name": "get_user_details",
        "description": GET_USER_DETAILS_DESCRIPTION,
        "inputSchema": {
            "type": "object",
            "properties": {
                "username": {
                    "type": "string",
                    "description": "The firstname of the user to retrieve, exactly as stored."
                }
            },
            "required": ["username"]
        }
    })
}

fn result_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_db() -> CustomerDb {
        let db = CustomerDb::open_in_memory().unwrap();
        db.init_demo().unwrap();
        db
    }

    #[test]
    fn initialize_reports_protocol_version() {
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} });
        let response = handle_request(&request, &demo_db());
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[test]
    fn list_exposes_get_user_details() {
        let request = json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" });
        let response = handle_request(&request, &demo_db());
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "get_user_details");
        assert_eq!(tools[0]["inputSchema"]["required"][0], "username");
    }

    #[test]
    fn call_returns_text_content() {
        let request = json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": { "name": "get_user_details", "arguments": { "username": "Ali" } }
        });
        let response = handle_request(&request, &demo_db());
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Balance: $120.00"));
        assert_eq!(response["result"]["isError"], false);
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let request = json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": { "name": "drop_tables", "arguments": {} }
        });
        let response = handle_request(&request, &demo_db());
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn missing_username_is_an_error() {
        let request = json!({
            "jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": { "name": "get_user_details", "arguments": {} }
        });
        let response = handle_request(&request, &demo_db());
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn unknown_method_is_an_error() {
        let request = json!({ "jsonrpc": "2.0", "id": 6, "method": "resources/list" });
        let response = handle_request(&request, &demo_db());
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
    }

    #[test]
    fn serve_answers_line_by_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut output = Vec::new();
        serve(input.as_bytes(), &mut output, &demo_db()).unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], PARSE_ERROR);
        assert_eq!(lines[2]["result"]["tools"][0]["name"], "get_user_details");
    }
}
