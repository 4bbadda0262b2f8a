//! Loading the `{"mcpServers": {...}}` configuration document from disk
//!

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

/// Failures reading or parsing an MCP-servers configuration file.
#[derive(Debug, Error)]
pub enum McpServersConfigError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse '{path}' as JSON: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Read and parse an MCP-servers document. The caller hands the resulting
/// [`Value`] to `ToolRegistry::initialize_mcp`.
pub fn load_mcp_servers_config(path: &Path) -> Result<Value, McpServersConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| McpServersConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| McpServersConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
