//! Error types for the tool registry.

use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// `initialize_mcp` was called a second time.
    #[error("registry already initialized")]
    AlreadyInitialized,

    /// The MCP-server configuration document could not be parsed.
    #[error("invalid MCP server configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// No executor is registered under this tool name.
    #[error("no executor for '{0}'")]
    NotFound(String),

    /// The tool name is not on the caller's allow-list.
    #[error("access denied for tool '{0}'")]
    AccessDenied(String),

    /// An MCP operation (acquiring a server, discovering, executing) failed.
    #[error(transparent)]
    Mcp(#[from] crate::mcp::McpError),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
