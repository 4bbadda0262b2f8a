//! The chat-completions client: one operation, `chat`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::{ChatMessage, Role, ToolCall, ToolSpec};

use super::decoding::DecodingConfig;
use super::error::ChatError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Submits one conversation turn and parses the assistant's reply. No
/// retries at this layer — those belong to whatever calls `chat`.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
        config: Option<&DecodingConfig>,
    ) -> Result<ChatMessage, ChatError>;
}

/// An OpenAI-compatible `POST <base_url>/chat/completions` client.
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("reqwest client"),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn build_body(
        messages: &[ChatMessage],
        tools: &[ToolSpec],
        config: &DecodingConfig,
    ) -> Result<Value, ChatError> {
        let mut body = match serde_json::to_value(config) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        body.insert(
            "messages".to_string(),
            serde_json::to_value(messages).map_err(|e| ChatError::Upstream {
                status: 0,
                body_excerpt: e.to_string(),
            })?,
        );
        if !tools.is_empty() {
            let tool_values: Vec<Value> = tools.iter().map(ToolSpec::to_openai_tool).collect();
            body.insert("tools".to_string(), Value::Array(tool_values));
        }
        Ok(Value::Object(body))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default = "default_role")]
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "tool_calls")]
    tool_calls: Option<Vec<ToolCall>>,
}

fn default_role() -> String {
    "assistant".to_string()
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
        config: Option<&DecodingConfig>,
    ) -> Result<ChatMessage, ChatError> {
        let config = match config {
            Some(c) => c.clone(),
            None => DecodingConfig::default(),
        };
        config.validate()?;

        let body = Self::build_body(messages, tools, &config)?;

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let excerpt: String = text.chars().take(500).collect();
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body_excerpt: excerpt,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|_| ChatError::Upstream {
                status: status.as_u16(),
                body_excerpt: text.chars().take(500).collect(),
            })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Upstream {
                status: status.as_u16(),
                body_excerpt: "response had no choices".to_string(),
            })?
            .message;

        let role = match message.role.as_str() {
            "assistant" => Role::Assistant,
            _ => Role::Assistant,
        };

        Ok(ChatMessage {
            role,
            content: message.content,
            tool_calls: message.tool_calls,
            tool_call_id: None,
        })
    }
}
