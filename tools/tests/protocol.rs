//! Drives the built tool-server binary over stdio, the way the orchestrator's
//! transport session does.

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdout, Command, Stdio};

struct Server {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<ChildStdout>,
}

impl Server {
    fn spawn(database: &std::path::Path) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_concierge-tools"))
            .arg("--database")
            .arg(database)
            .arg("--init-demo")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn concierge-tools");

        let stdin = child.stdin.take().unwrap();
        let reader = BufReader::new(child.stdout.take().unwrap());
        Self {
            child,
            stdin,
            reader,
        }
    }

    fn request(&mut self, request: Value) -> Value {
        let mut line = request.to_string();
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).unwrap();
        self.stdin.flush().unwrap();

        let mut response = String::new();
        self.reader.read_line(&mut response).unwrap();
        serde_json::from_str(&response).expect("response is not valid JSON")
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn full_session_over_stdio() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::spawn(&dir.path().join("customers.db"));

    let init = server.request(json!({
        "jsonrpc": "2.0", "id": 1, "method": "initialize",
        "params": { "protocolVersion": "2024-11-05", "capabilities": { "tools": {} } }
    }));
    assert_eq!(init["id"], 1);
    assert!(init["result"]["protocolVersion"].is_string());

    let list = server.request(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }));
    assert_eq!(list["result"]["tools"][0]["name"], "get_user_details");

    let call = server.request(json!({
        "jsonrpc": "2.0", "id": 3, "method": "tools/call",
        "params": { "name": "get_user_details", "arguments": { "username": "Ali" } }
    }));
    let text = call["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("User Details:"));
    assert!(text.contains("Balance: $120.00"));

    let miss = server.request(json!({
        "jsonrpc": "2.0", "id": 4, "method": "tools/call",
        "params": { "name": "get_user_details", "arguments": { "username": "Nobody" } }
    }));
    let text = miss["result"]["content"][0]["text"].as_str().unwrap();
    assert_eq!(text, "No user found with Username Nobody");
}
