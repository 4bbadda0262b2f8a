//! MCP subprocess client and server manager.

pub mod client;
pub mod config;
pub mod error;
pub mod manager;

pub use client::McpClient;
pub use config::MCPServerConfig;
pub use error::McpError;
pub use manager::ServerManager;
