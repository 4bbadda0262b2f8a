//! Ambient configuration: environment variables and the MCP-servers
//! document.

mod environment;
mod mcp_servers;

pub use environment::EnvironmentLoader;
pub use mcp_servers::{load_mcp_servers_config, McpServersConfigError};
