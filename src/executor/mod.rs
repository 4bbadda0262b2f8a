//! Uniform call surface over in-process and MCP-backed tools.

mod mcp_executor;
mod native;

pub use mcp_executor::McpExecutor;
pub use native::NativeExecutor;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::mcp::McpError;
use crate::types::{ToolCall, ToolSpec};

/// A tool callable from the agent loop, regardless of where it actually
/// runs. Concrete variants are tagged by construction (`McpExecutor`,
/// `NativeExecutor`), not by an inheritance hierarchy.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameter_schema(&self) -> &Value;

    /// Whether this executor is the one that should service `call`. The
    /// default implementation matches on tool name, which is sufficient for
    /// every executor in this crate.
    fn can_handle(&self, call: &ToolCall) -> bool {
        call.function.name == self.name()
    }

    /// Run the tool and return its result as a string. Implementations must
    /// be safe to call concurrently — an MCP-backed executor gets this for
    /// free from the client's request multiplexing.
    async fn execute(&self, call: &ToolCall, timeout: Option<Duration>)
        -> Result<String, McpError>;

    /// This executor's catalogue entry.
    fn as_tool_spec(&self) -> ToolSpec {
        ToolSpec::new(
            self.name().to_string(),
            self.description().to_string(),
            self.parameter_schema().clone(),
        )
    }
}
