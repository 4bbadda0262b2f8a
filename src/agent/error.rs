//! Error taxonomy for the agent conversation loop.

use thiserror::Error;

/// Failures from `Agent::send_message` and construction.
#[derive(Debug, Error)]
pub enum AgentError {
    /// `allowed` names a tool the registry doesn't currently expose.
    #[error("unknown tool in allow-list: '{0}'")]
    UnknownAllowedTool(String),

    /// A tool call named a tool outside the agent's allow-list.
    #[error("access denied for tool '{0}'")]
    AccessDenied(String),

    /// The loop exceeded `MAX_ROUNDS` tool-call rounds in one `send_message`.
    #[error("exceeded maximum of {0} tool-call rounds")]
    RunawayLoop(u32),

    /// The chat client failed.
    #[error(transparent)]
    Chat(#[from] crate::chat::ChatError),
}
