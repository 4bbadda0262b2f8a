//! Error types for decoding-config validation and the chat API client.

use thiserror::Error;

/// A `DecodingConfig` field fell outside its validated range.
#[derive(Debug, Error)]
#[error("invalid decoding config: {0}")]
pub struct InvalidDecodingConfig(pub String);

/// Failures calling the chat-completions endpoint.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The decoding config failed validation.
    #[error(transparent)]
    InvalidConfig(#[from] InvalidDecodingConfig),

    /// The HTTP request itself failed (DNS, TCP, TLS, ...).
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-200 status or a body this client
    /// doesn't understand.
    #[error("chat API error (status {status}): {body_excerpt}")]
    Upstream { status: u16, body_excerpt: String },
}
