//! A client-side runtime that discovers tools from MCP servers and drives
//! them through an OpenAI-compatible chat-completions loop.
//!
//! - [`jsonrpc`] — JSON-RPC 2.0 line framing.
//! - [`mcp`] — the MCP subprocess client and server manager.
//! - [`executor`] — the uniform call surface over in-process and MCP tools.
//! - [`registry`] — the named tool index and its filtered view.
//! - [`chat`] — the OpenAI-compatible chat-completions client.
//! - [`agent`] — the conversation loop tying everything together.

pub mod agent;
pub mod chat;
pub mod config;
pub mod executor;
pub mod jsonrpc;
pub mod logging;
pub mod mcp;
pub mod registry;
pub mod types;
