//! A [`ToolExecutor`] backed by one tool on a live MCP client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::mcp::{McpClient, McpError};
use crate::types::{ToolCall, ToolSpec};

use super::ToolExecutor;

/// Routes calls for one tool name to `tools/call` on its owning MCP client.
/// Safe for concurrent `execute` by construction: the client multiplexes
/// requests itself.
pub struct McpExecutor {
    client: Arc<McpClient>,
    spec: ToolSpec,
}

impl McpExecutor {
    pub fn new(client: Arc<McpClient>, spec: ToolSpec) -> Self {
        Self { client, spec }
    }
}

#[async_trait]
impl ToolExecutor for McpExecutor {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.spec.parameter_schema
    }

    async fn execute(
        &self,
        call: &ToolCall,
        timeout: Option<Duration>,
    ) -> Result<String, McpError> {
        self.client
            .execute(&call.function.name, &call.function.arguments, timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn name_and_schema_come_from_the_spec() {
        let client = Arc::new(McpClient::new("test-server"));
        let spec = ToolSpec::new("get_weather", "fetch weather", json!({"type": "object"}));
        let executor = McpExecutor::new(client, spec);

        assert_eq!(executor.name(), "get_weather");
        assert_eq!(executor.description(), "fetch weather");
        assert_eq!(executor.as_tool_spec().name, "get_weather");
    }
}
