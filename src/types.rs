//! Shared data model: the types every component passes around.
//!
//! These are intentionally free of any single component's dependencies (no
//! `reqwest`, no `tokio::process`) so that `jsonrpc`, `mcp`, `executor`,
//! `registry`, `chat`, and `agent` can all depend on them without pulling
//! each other in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single tool-call the LLM asked the runtime to perform.
///
/// `arguments` is kept as the raw JSON-document-as-string the LLM emitted;
/// callers parse it only when they're about to execute the call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// The `function` field of a [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// The role of a [`ChatMessage`] in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry in a conversation transcript.
///
/// Invariants enforced elsewhere, not by this type: exactly one `System`
/// message, first in the transcript submitted to the LLM; every `Tool`
/// message's `tool_call_id` matches an earlier `Assistant` message's
/// [`ToolCall`] id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "tool_calls", skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(rename = "tool_call_id", skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(text.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(text.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: Option<String>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Tool-call ids this message carries (only non-empty for `Assistant`).
    pub fn tool_call_ids(&self) -> Vec<&str> {
        self.tool_calls
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|tc| tc.id.as_str())
            .collect()
    }
}

/// A tool's catalogue entry: name, description, and
/// a JSON-Schema parameter document. Name is unique within a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "parameters")]
    pub parameter_schema: Value,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameter_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema,
        }
    }

    /// Render as an OpenAI `tools[]` entry.
    pub fn to_openai_tool(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameter_schema,
            }
        })
    }
}
