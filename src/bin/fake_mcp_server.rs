//! A minimal stdio MCP server used only as a test fixture for
//! `tests/mcp_discovery.rs`. Responds to `tools/list` with no `tools` field
//! (forcing fallback discovery), to `list_tools` with one tool named `x`,
//! and echoes `tools/call` arguments back as its result text.

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        let Ok(request) = serde_json::from_str::<Value>(&line) else {
            continue;
        };

        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");

        let response = match method {
            "tools/list" => json!({"jsonrpc": "2.0", "id": id, "result": {}}),
            "list_tools" => json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "tools": [
                        {"name": "x", "description": "", "inputSchema": {"type": "object"}}
                    ]
                }
            }),
            "tools/call" => {
                let arguments = request
                    .get("params")
                    .and_then(|p| p.get("arguments"))
                    .cloned()
                    .unwrap_or(json!({}));
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {
                        "content": [{"type": "text", "text": arguments.to_string()}]
                    }
                })
            }
            _ => {
                json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "method not found"}})
            }
        };

        let _ = writeln!(stdout, "{response}");
        let _ = stdout.flush();
    }
}
