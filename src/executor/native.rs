//! A [`ToolExecutor`] that runs entirely in-process — used for built-in
//! tools and in tests, where spinning up a real MCP server would be overkill.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::mcp::McpError;
use crate::types::ToolCall;

use super::ToolExecutor;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<String, McpError>> + Send>>;
type Handler = Box<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// An in-process tool: a name, description, JSON-Schema, and a handler
/// closure invoked with the call's parsed arguments.
pub struct NativeExecutor {
    name: String,
    description: String,
    parameter_schema: Value,
    handler: Handler,
}

impl NativeExecutor {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameter_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, McpError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema,
            handler: Box::new(move |args| Box::pin(handler(args))),
        }
    }
}

#[async_trait]
impl ToolExecutor for NativeExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    async fn execute(
        &self,
        call: &ToolCall,
        _timeout: Option<Duration>,
    ) -> Result<String, McpError> {
        let args: Value = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| serde_json::json!({}));
        (self.handler)(args).await
    }
}
