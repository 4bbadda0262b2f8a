//! Error taxonomy for the MCP client and server manager.

use thiserror::Error;

/// Failures arising from spawning, discovering on, or calling an MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// The subprocess failed to spawn.
    #[error("failed to spawn MCP server '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// `initialize()` was called a second time.
    #[error("MCP client already initialized")]
    AlreadyInitialized,

    /// An operation other than `initialize` was attempted before the client
    /// reached the `ready` state.
    #[error("MCP client is not ready (state: {0})")]
    NotReady(&'static str),

    /// Every discovery method (`tools/list` and its fallbacks) failed or
    /// returned no tools.
    #[error("no tools discovered from MCP server '{server}'")]
    NoToolsDiscovered { server: String },

    /// A request timed out waiting for a response.
    #[error("MCP request '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    /// The server answered with a JSON-RPC error, or `isError: true`.
    #[error("MCP tool '{tool}' failed: {message}")]
    ToolFailure { tool: String, message: String },

    /// The client (or the request it was servicing) was disposed before a
    /// response arrived.
    #[error("MCP client was disposed")]
    Disposed,

    /// Underlying I/O failure writing to or reading from the subprocess.
    #[error("MCP I/O error: {0}")]
    Io(#[from] std::io::Error),
}
