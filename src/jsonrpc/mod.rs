//! JSON-RPC 2.0 line framing over a duplex byte pipe.
//!
//! Every message is a single UTF-8 JSON object terminated by `\n`. This
//! module only knows how to encode requests and decode whatever comes back;
//! it has no opinion about transport (stdio, socket, ...) or about MCP
//! method names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

mod error;
pub use error::Error;

/// A JSON-RPC 2.0 request. Notifications are requests with `id: None`.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// A request expecting a response, carrying the given correlation id.
    pub fn call(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// A fire-and-forget notification (no id, no response expected).
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: None,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A decoded line from the peer: either a response to one of our requests or
/// a notification/unsolicited message we don't correlate.
#[derive(Debug, Clone)]
pub enum Frame {
    /// A response carrying the id it answers.
    Response {
        id: u64,
        result: Result<Value, RpcError>,
    },
    /// Anything without a recognizable integer id — a notification, or a
    /// response to a request we never sent. The MCP client treats both as
    /// "not ours" and drops them silently (spec: server-initiated traffic
    /// may appear on the same pipe).
    Other,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Serialize one request as a single `\n`-terminated line.
pub fn encode_line(request: &Request) -> Result<String, Error> {
    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    Ok(line)
}

/// Parse one line of peer output into a [`Frame`].
///
/// A line that isn't valid JSON, or whose `id` isn't a non-negative integer,
/// decodes as [`Frame::Other`] rather than an error — stray stdout lines are
/// expected from noisy MCP server implementations and must not tear down the
/// reader task.
pub fn decode_line(line: &str) -> Frame {
    let Ok(raw) = serde_json::from_str::<RawMessage>(line) else {
        return Frame::Other;
    };
    let Some(id) = raw.id.as_ref().and_then(Value::as_u64) else {
        return Frame::Other;
    };
    let result = match raw.error {
        Some(err) => Err(err),
        None => Ok(raw.result.unwrap_or(Value::Null)),
    };
    Frame::Response { id, result }
}
