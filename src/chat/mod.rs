//! The OpenAI-compatible chat-completions client.

mod client;
mod decoding;
mod error;

pub use client::{ChatClient, HttpChatClient};
pub use decoding::DecodingConfig;
pub use error::{ChatError, InvalidDecodingConfig};
