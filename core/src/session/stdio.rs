//! Child-process JSON-RPC transport
//!
//! Speaks line-delimited JSON-RPC 2.0 to a tool-server process over stdio:
//! `initialize` on connect, then `tools/list` and `tools/call`. Requests are
//! correlated by id; responses left unread by a cancelled call are drained
//! and discarded on the next request instead of being misdelivered.

use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::{ConnectionState, McpServerConfig, ToolSession, ToolSpec};
use crate::error::{Result, SessionError, ToolError};

const PROTOCOL_VERSION: &str = "2024-11-05";

struct Channel {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    // Bytes read off the pipe but not yet split into a frame; survives a
    // cancelled read so the next request resumes mid-line instead of
    // seeing a truncated tail
    buf: Vec<u8>,
}

/// A live session to a tool-server process
///
/// At most one request is in flight at a time; concurrent callers serialize
/// on the channel lock.
pub struct McpSession {
    config: McpServerConfig,
    state: StdMutex<ConnectionState>,
    channel: Mutex<Option<Channel>>,
    request_id: AtomicU64,
}

impl McpSession {
    /// Create a new, not yet connected session
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            config,
            state: StdMutex::new(ConnectionState::Disconnected),
            channel: Mutex::new(None),
            request_id: AtomicU64::new(0),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap() = state;
    }

    /// Establish the channel: spawn the tool server and run the
    /// `initialize` handshake. Connecting an already connected session is a
    /// no-op; connecting a closed one fails.
    pub async fn connect(&self) -> Result<()> {
        let mut channel = self.channel.lock().await;

        match self.state() {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Closed => return Err(SessionError::Closed.into()),
            _ => {}
        }

        if self.config.command.is_empty() {
            return Err(SessionError::Connection {
                message: "tool server command is empty".to_string(),
            }
            .into());
        }

        self.set_state(ConnectionState::Connecting);

        let mut cmd = Command::new(&self.config.command[0]);
        if self.config.command.len() > 1 {
            cmd.args(&self.config.command[1..]);
        }
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            self.set_state(ConnectionState::Disconnected);
            SessionError::Connection {
                message: format!("failed to spawn {}: {}", self.config.command[0], e),
            }
        })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.start_kill();
                self.set_state(ConnectionState::Disconnected);
                return Err(SessionError::Connection {
                    message: "no stdio pipes available for tool server".to_string(),
                }
                .into());
            }
        };

        *channel = Some(Channel {
            child,
            stdin,
            stdout,
            buf: Vec::new(),
        });

        let init = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "clientInfo": {
                "name": "concierge",
                "version": crate::VERSION,
            }
        });

        let handshake = timeout(
            self.config.timeout(),
            self.request_on(&mut channel, "initialize", init),
        )
        .await;

        match handshake {
            Ok(Ok(response)) => {
                if let Some(error) = response.get("error") {
                    self.teardown(&mut channel);
                    self.set_state(ConnectionState::Disconnected);
                    return Err(SessionError::Connection {
                        message: format!("initialize handshake rejected: {}", error),
                    }
                    .into());
                }
                self.set_state(ConnectionState::Connected);
                tracing::info!(command = %self.config.command[0], "tool session connected");
                Ok(())
            }
            Ok(Err(e)) => {
                self.teardown(&mut channel);
                self.set_state(ConnectionState::Disconnected);
                Err(SessionError::Connection {
                    message: format!("initialize handshake failed: {}", e),
                }
                .into())
            }
            Err(_) => {
                self.teardown(&mut channel);
                self.set_state(ConnectionState::Disconnected);
                Err(SessionError::Connection {
                    message: format!(
                        "initialize handshake timed out after {:?}",
                        self.config.timeout()
                    ),
                }
                .into())
            }
        }
    }

    fn teardown(&self, channel: &mut Option<Channel>) {
        if let Some(mut ch) = channel.take() {
            let _ = ch.child.start_kill();
        }
    }

    /// Send one request and read its response on an already-locked channel
    async fn request_on(
        &self,
        channel: &mut Option<Channel>,
        method: &str,
        params: Value,
    ) -> Result<Value> {
        let ch = channel.as_mut().ok_or(match self.state() {
            ConnectionState::Closed => SessionError::Closed,
            _ => SessionError::NotConnected,
        })?;

        let id = self.request_id.fetch_add(1, Ordering::SeqCst) + 1;
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut line = serde_json::to_string(&request)?;
        line.push('\n');
        ch.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SessionError::Transport {
                message: format!("write failed: {}", e),
            })?;
        ch.stdin.flush().await.map_err(|e| SessionError::Transport {
            message: format!("flush failed: {}", e),
        })?;

        loop {
            let line = read_frame(&mut ch.stdout, &mut ch.buf).await?;
            if line.is_empty() {
                continue;
            }

            let response: Value =
                serde_json::from_str(&line).map_err(|e| SessionError::Transport {
                    message: format!("malformed response: {}", e),
                })?;

            match response.get("id").and_then(Value::as_u64) {
                // Notification, no correlation id
                None => continue,
                Some(got) if got == id => return Ok(response),
                Some(stale) => {
                    // Response to a request whose caller was cancelled
                    tracing::debug!(stale_id = stale, expected = id, "discarding stale response");
                    continue;
                }
            }
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let mut channel = self.channel.lock().await;
        self.request_on(&mut channel, method, params).await
    }
}

#[async_trait::async_trait]
impl ToolSession for McpSession {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>> {
        let response = timeout(self.config.timeout(), self.request("tools/list", json!({})))
            .await
            .map_err(|_| SessionError::Transport {
                message: format!("tools/list timed out after {:?}", self.config.timeout()),
            })??;

        if let Some(error) = response.get("error") {
            return Err(SessionError::Transport {
                message: format!("tools/list failed: {}", error),
            }
            .into());
        }

        let tools = response
            .get("result")
            .and_then(|r| r.get("tools"))
            .cloned()
            .unwrap_or_else(|| json!([]));

        Ok(serde_json::from_value(tools)?)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let params = json!({ "name": name, "arguments": arguments });

        let response = timeout(self.config.timeout(), self.request("tools/call", params))
            .await
            .map_err(|_| ToolError::Invocation {
                name: name.to_string(),
                message: format!("timed out after {:?}", self.config.timeout()),
            })??;

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ToolError::Invocation {
                name: name.to_string(),
                message,
            }
            .into());
        }

        let result = response
            .get("result")
            .ok_or_else(|| SessionError::Transport {
                message: "no result in tool response".to_string(),
            })?;

        let content = extract_text_content(result);
        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(ToolError::Invocation {
                name: name.to_string(),
                message: content,
            }
            .into());
        }

        Ok(content)
    }

    async fn close(&self) -> Result<()> {
        let mut channel = self.channel.lock().await;
        self.teardown(&mut channel);
        self.set_state(ConnectionState::Closed);
        Ok(())
    }
}

/// Read one newline-terminated frame.
///
/// Bytes land in `buf` via `read_buf` (cancel-safe) before the frame is
/// split off, so a caller whose timeout fires mid-line loses nothing: the
/// next read picks up the buffered tail.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    loop {
        if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let frame: Vec<u8> = buf.drain(..=pos).collect();
            return match String::from_utf8(frame) {
                Ok(line) => Ok(line.trim().to_string()),
                Err(e) => Err(SessionError::Transport {
                    message: format!("malformed response: {}", e),
                }
                .into()),
            };
        }

        let n = reader
            .read_buf(buf)
            .await
            .map_err(|e| SessionError::Transport {
                message: format!("read failed: {}", e),
            })?;
        if n == 0 {
            return Err(SessionError::Transport {
                message: "channel closed by tool server".to_string(),
            }
            .into());
        }
    }
}

/// Extract the text content of a tool result; falls back to the raw JSON for
/// results without a text block
fn extract_text_content(result: &Value) -> String {
    if let Some(blocks) = result.get("content").and_then(Value::as_array) {
        let texts: Vec<&str> = blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect();
        if !texts.is_empty() {
            return texts.join("\n");
        }
    }
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> McpServerConfig {
        McpServerConfig::new(vec!["true".to_string()])
    }

    #[tokio::test]
    async fn call_before_connect_fails_fast() {
        let session = McpSession::new(test_config());
        let err = session.call_tool("anything", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let session = McpSession::new(test_config());
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(session.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn connect_after_close_fails() {
        let session = McpSession::new(test_config());
        session.close().await.unwrap();
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, crate::Error::Session(SessionError::Closed)));
    }

    #[tokio::test]
    async fn connect_with_empty_command_fails() {
        let session = McpSession::new(McpServerConfig::new(Vec::new()));
        let err = session.connect().await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::Connection { .. })
        ));
        // A failed connect leaves the session closable
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn connect_fails_when_initialize_is_rejected() {
        // A server that answers the handshake with a JSON-RPC error, e.g. a
        // protocol-version mismatch
        let script = r#"read line; printf '%s\n' '{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"unsupported protocol version"}}'"#;
        let session = McpSession::new(McpServerConfig::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
        ]));

        let err = session.connect().await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::Connection { .. })
        ));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn timed_out_read_resumes_from_buffered_tail() {
        let (mut writer, mut reader) = tokio::io::duplex(64);
        let mut buf = Vec::new();

        // A response that stalls mid-line; the caller's deadline fires first
        writer.write_all(b"{\"id\":1").await.unwrap();
        let partial = timeout(
            std::time::Duration::from_millis(50),
            read_frame(&mut reader, &mut buf),
        )
        .await;
        assert!(partial.is_err());

        // The rest arrives; both frames come out whole
        writer
            .write_all(b",\"result\":{}}\n{\"id\":2}\n")
            .await
            .unwrap();
        assert_eq!(
            read_frame(&mut reader, &mut buf).await.unwrap(),
            "{\"id\":1,\"result\":{}}"
        );
        assert_eq!(read_frame(&mut reader, &mut buf).await.unwrap(), "{\"id\":2}");
    }

    #[test]
    fn extract_text_joins_blocks() {
        let result = json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "text", "text": "second" },
            ]
        });
        assert_eq!(extract_text_content(&result), "first\nsecond");
    }

    #[test]
    fn extract_text_falls_back_to_raw_json() {
        let result = json!({ "content": [] });
        assert_eq!(extract_text_content(&result), result.to_string());
    }

    #[test]
    fn tool_spec_deserializes_camel_case_schema() {
        let spec: ToolSpec = serde_json::from_value(json!({
            "name": "get_user_details",
            "description": "Look up a user",
            "inputSchema": {
                "type": "object",
                "properties": { "username": { "type": "string" } },
                "required": ["username"]
            }
        }))
        .unwrap();
        assert_eq!(spec.name, "get_user_details");
        assert_eq!(spec.input_schema["required"][0], "username");
    }
}
