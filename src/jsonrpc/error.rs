//! Error type for JSON-RPC framing.

use thiserror::Error;

/// Failures encoding a request into a wire line.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be serialized to JSON.
    #[error("failed to serialize JSON-RPC request: {0}")]
    Serialize(#[from] serde_json::Error),
}
