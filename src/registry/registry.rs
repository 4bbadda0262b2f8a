//! The MCP-backed, named index of tool executors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::executor::{McpExecutor, ToolExecutor};
use crate::mcp::{MCPServerConfig, ServerManager};
use crate::types::{ToolCall, ToolSpec};

use super::{RegistryError, RegistryResult, ToolCatalogue};

#[derive(Debug, Deserialize)]
struct McpServersDocument {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: HashMap<String, MCPServerConfig>,
}

/// One MCP server this registry acquired a client for, kept around so
/// `shutdown` can release it.
struct AcquiredServer {
    config: MCPServerConfig,
    client: Arc<crate::mcp::McpClient>,
}

/// Named index of tool executors, loadable from an `{"mcpServers": {...}}`
/// configuration document.
pub struct ToolRegistry {
    executors: RwLock<HashMap<String, Arc<dyn ToolExecutor>>>,
    manager: Arc<ServerManager>,
    acquired: std::sync::Mutex<Vec<AcquiredServer>>,
    initialized: AtomicBool,
}

impl ToolRegistry {
    pub fn new(manager: Arc<ServerManager>) -> Self {
        Self {
            executors: RwLock::new(HashMap::new()),
            manager,
            acquired: std::sync::Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Load every server named in `config` (`{"mcpServers": {name:
    /// MCPServerConfigJson}}`), registering an executor per discovered tool.
    ///
    /// Fails only if the document itself doesn't parse. A single server
    /// failing to spawn or discover tools is logged and skipped — the
    /// registry ends up initialized with whatever succeeded.
    pub async fn initialize_mcp(&self, config: &Value) -> RegistryResult<()> {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RegistryError::AlreadyInitialized);
        }

        let document: McpServersDocument = serde_json::from_value(config.clone())?;

        for (server_name, server_config) in document.mcp_servers {
            match self.manager.acquire(&server_config).await {
                Ok(client) => {
                    let tools = client.tools().await;
                    for spec in tools {
                        let executor = Arc::new(McpExecutor::new(Arc::clone(&client), spec));
                        self.register(executor);
                    }
                    self.acquired.lock().unwrap().push(AcquiredServer {
                        config: server_config,
                        client,
                    });
                }
                Err(e) => {
                    warn!(server = %server_name, error = %e, "MCP server failed to initialize, skipping");
                }
            }
        }

        Ok(())
    }

    /// Release every MCP client this registry acquired and drop all
    /// executors.
    pub async fn shutdown(&self) {
        self.clear();
        let acquired = std::mem::take(&mut *self.acquired.lock().unwrap());
        for server in acquired {
            self.manager.release(&server.config, &server.client).await;
        }
    }
}

#[async_trait]
impl ToolCatalogue for ToolRegistry {
    fn list_tools(&self) -> Vec<ToolSpec> {
        self.executors
            .read()
            .unwrap()
            .values()
            .map(|e| e.as_tool_spec())
            .collect()
    }

    fn find(&self, call: &ToolCall) -> Option<Arc<dyn ToolExecutor>> {
        self.executors
            .read()
            .unwrap()
            .get(&call.function.name)
            .cloned()
    }

    async fn execute(&self, call: &ToolCall, timeout: Option<Duration>) -> RegistryResult<String> {
        let executor = self
            .find(call)
            .ok_or_else(|| RegistryError::NotFound(call.function.name.clone()))?;
        Ok(executor.execute(call, timeout).await?)
    }

    fn register(&self, executor: Arc<dyn ToolExecutor>) {
        let name = executor.name().to_string();
        let mut executors = self.executors.write().unwrap();
        if executors.contains_key(&name) {
            warn!(tool = %name, "tool name collision across MCP servers, last writer wins");
        }
        executors.insert(name, executor);
    }

    fn clear(&self) {
        self.executors.write().unwrap().clear();
    }
}
