//! The conversation loop: transcript bookkeeping plus automatic tool
//! dispatch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::chat::{ChatClient, DecodingConfig};
use crate::registry::ToolCatalogue;
use crate::types::{ChatMessage, Role, ToolCall};

use super::error::AgentError;

/// Bound on tool-call rounds within one `send_message` call.
pub const MAX_ROUNDS: u32 = 40;

/// Drives one conversation: owns its transcript, borrows a registry and a
/// chat client. `allowed`, when set, is a defense-in-depth check below the
/// model — the registry the agent was built with may already filter the
/// catalogue the model sees, but a hallucinated tool name is checked again
/// here before dispatch.
pub struct Agent {
    transcript: Vec<ChatMessage>,
    system_prompt: String,
    registry: Arc<dyn ToolCatalogue>,
    chat_client: Arc<dyn ChatClient>,
    config: DecodingConfig,
    allowed: Option<HashSet<String>>,
    tool_timeout: Option<Duration>,
}

impl Agent {
    /// Fails if `allowed` names a tool the registry doesn't currently
    /// expose, checked once at construction.
    pub fn new(
        system_prompt: impl Into<String>,
        registry: Arc<dyn ToolCatalogue>,
        chat_client: Arc<dyn ChatClient>,
        config: DecodingConfig,
        allowed: Option<HashSet<String>>,
    ) -> Result<Self, AgentError> {
        if let Some(names) = &allowed {
            let known: HashSet<String> =
                registry.list_tools().into_iter().map(|t| t.name).collect();
            for name in names {
                if !known.contains(name) {
                    return Err(AgentError::UnknownAllowedTool(name.clone()));
                }
            }
        }

        Ok(Self {
            transcript: Vec::new(),
            system_prompt: system_prompt.into(),
            registry,
            chat_client,
            config,
            allowed,
            tool_timeout: None,
        })
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// The transcript as it currently stands, for inspection/testing.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Drop every non-system message; the system-prompt anchor survives.
    pub fn clear_conversation(&mut self) {
        self.transcript.retain(|m| m.role == Role::System);
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.config.temperature = temperature;
    }

    pub fn set_top_p(&mut self, top_p: f32) {
        self.config.top_p = top_p;
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) {
        self.config.max_tokens = max_tokens;
    }

    pub fn set_frequency_penalty(&mut self, penalty: f32) {
        self.config.frequency_penalty = penalty;
    }

    pub fn set_presence_penalty(&mut self, penalty: f32) {
        self.config.presence_penalty = penalty;
    }

    pub fn config(&self) -> &DecodingConfig {
        &self.config
    }

    /// The chat/tool round-trip loop.
    pub async fn send_message(
        &mut self,
        user_text: impl Into<String>,
        config_override: Option<&DecodingConfig>,
    ) -> Result<ChatMessage, AgentError> {
        self.transcript.retain(|m| m.role != Role::System);
        self.transcript
            .insert(0, ChatMessage::system(self.system_prompt.clone()));
        self.transcript.push(ChatMessage::user(user_text.into()));

        let mut rounds: u32 = 0;

        loop {
            rounds += 1;

            let tools = self.registry.list_tools();
            let config = config_override.unwrap_or(&self.config);
            let assistant = self
                .chat_client
                .chat(&self.transcript, &tools, Some(config))
                .await?;
            self.transcript.push(assistant.clone());

            let tool_calls = match assistant.tool_calls.clone() {
                Some(calls) if !calls.is_empty() => calls,
                _ => return Ok(assistant),
            };

            if rounds == MAX_ROUNDS {
                self.abort_cleanup(&tool_calls);
                return Err(AgentError::RunawayLoop(MAX_ROUNDS));
            }

            if let Some(denied) = self.validate_tool_access(&tool_calls) {
                return Err(AgentError::AccessDenied(denied));
            }

            for call in &tool_calls {
                let outcome = self.registry.execute(call, self.tool_timeout).await;
                let content = match outcome {
                    Ok(result) => result,
                    Err(e) => format!("Tool execution failed: {e}"),
                };
                self.transcript
                    .push(ChatMessage::tool(call.id.clone(), content));
            }
        }
    }

    /// The first tool name in `tool_calls` outside `allowed`, if any.
    fn validate_tool_access(&self, tool_calls: &[ToolCall]) -> Option<String> {
        let allowed = self.allowed.as_ref()?;
        tool_calls
            .iter()
            .map(|c| &c.function.name)
            .find(|name| !allowed.contains(*name))
            .cloned()
    }

    /// Synthesize role=tool replies (and a closing assistant message) for
    /// every unanswered call in the offending round, so the transcript
    /// remains well-formed for any future turn.
    fn abort_cleanup(&mut self, tool_calls: &[ToolCall]) {
        for call in tool_calls {
            self.transcript.push(ChatMessage::tool(
                call.id.clone(),
                "Tool execution was not performed: the conversation exceeded the maximum tool-call round bound.",
            ));
        }
        self.transcript.push(ChatMessage::assistant(
            Some(
                "I've reached the maximum number of tool-call rounds and must stop here."
                    .to_string(),
            ),
            None,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatError;
    use crate::executor::NativeExecutor;
    use crate::mcp::ServerManager;
    use crate::registry::ToolRegistry;
    use crate::types::{FunctionCall, ToolSpec};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// A scripted chat client: returns one canned message per call, in order.
    struct ScriptedChatClient {
        responses: Mutex<Vec<ChatMessage>>,
        calls: AtomicUsize,
    }

    impl ScriptedChatClient {
        fn new(responses: Vec<ChatMessage>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChatClient {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSpec],
            _config: Option<&DecodingConfig>,
        ) -> Result<ChatMessage, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or(ChatError::Upstream {
                    status: 0,
                    body_excerpt: "script exhausted".to_string(),
                })
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    fn weather_registry() -> Arc<ToolRegistry> {
        let registry = Arc::new(ToolRegistry::new(Arc::new(ServerManager::new())));
        registry.register(Arc::new(NativeExecutor::new(
            "get_weather",
            "fetch weather",
            json!({"type": "object"}),
            |args| async move {
                let city = args
                    .get("location")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                Ok(match city.as_str() {
                    "Tokyo" => "28°C, Clear".to_string(),
                    "Paris" => "20°C, Cloudy".to_string(),
                    _ => "24°C, Partly Cloudy".to_string(),
                })
            },
        )));
        registry
    }

    #[tokio::test]
    async fn single_tool_happy_path() {
        let registry = weather_registry();
        let chat = Arc::new(ScriptedChatClient::new(vec![
            ChatMessage::assistant(
                None,
                Some(vec![tool_call(
                    "c1",
                    "get_weather",
                    r#"{"location":"Hangzhou"}"#,
                )]),
            ),
            ChatMessage::assistant(
                Some("The weather in Hangzhou is 24°C, Partly Cloudy".to_string()),
                None,
            ),
        ]));

        let mut agent = Agent::new(
            "you are helpful",
            registry,
            chat,
            DecodingConfig::default(),
            None,
        )
        .unwrap();
        let result = agent
            .send_message("What's the weather in Hangzhou?", None)
            .await
            .unwrap();

        assert_eq!(
            result.content.as_deref(),
            Some("The weather in Hangzhou is 24°C, Partly Cloudy")
        );
        let roles: Vec<Role> = agent.transcript().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant
            ]
        );
        assert_eq!(
            agent.transcript()[3].content.as_deref(),
            Some("24°C, Partly Cloudy")
        );
    }

    #[tokio::test]
    async fn two_parallel_tool_calls_preserve_order() {
        let registry = weather_registry();
        let chat = Arc::new(ScriptedChatClient::new(vec![
            ChatMessage::assistant(
                None,
                Some(vec![
                    tool_call("c1", "get_weather", r#"{"location":"Tokyo"}"#),
                    tool_call("c2", "get_weather", r#"{"location":"Paris"}"#),
                ]),
            ),
            ChatMessage::assistant(
                Some("Tokyo: 28°C, Clear. Paris: 20°C, Cloudy.".to_string()),
                None,
            ),
        ]));

        let mut agent = Agent::new("sys", registry, chat, DecodingConfig::default(), None).unwrap();
        agent.send_message("weather please", None).await.unwrap();

        let tool_messages: Vec<&ChatMessage> = agent
            .transcript()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(tool_messages[0].content.as_deref(), Some("28°C, Clear"));
        assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("c2"));
        assert_eq!(tool_messages[1].content.as_deref(), Some("20°C, Cloudy"));
    }

    #[tokio::test]
    async fn access_denied_before_tool_runs() {
        let registry = weather_registry();
        let mock_was_called = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&mock_was_called);
        registry.register(Arc::new(NativeExecutor::new(
            "mock_tool",
            "",
            json!({}),
            move |_| {
                let flag = Arc::clone(&flag);
                async move {
                    flag.fetch_add(1, Ordering::SeqCst);
                    Ok(String::new())
                }
            },
        )));

        let chat = Arc::new(ScriptedChatClient::new(vec![ChatMessage::assistant(
            None,
            Some(vec![tool_call("c1", "mock_tool", "{}")]),
        )]));

        let allowed: HashSet<String> = ["get_weather".to_string()].into_iter().collect();
        let mut agent = Agent::new(
            "sys",
            registry,
            chat,
            DecodingConfig::default(),
            Some(allowed),
        )
        .unwrap();

        let err = agent.send_message("do something", None).await.unwrap_err();
        assert!(matches!(err, AgentError::AccessDenied(name) if name == "mock_tool"));
        assert_eq!(mock_was_called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn runaway_loop_leaves_a_balanced_transcript() {
        let registry = Arc::new(ToolRegistry::new(Arc::new(ServerManager::new())));
        registry.register(Arc::new(NativeExecutor::new(
            "ping",
            "",
            json!({}),
            |_| async move { Ok("ok".to_string()) },
        )));

        let fixed_point = ChatMessage::assistant(None, Some(vec![tool_call("c", "ping", "{}")]));
        let responses: Vec<ChatMessage> = (0..(MAX_ROUNDS as usize))
            .map(|_| fixed_point.clone())
            .collect();
        let chat = Arc::new(ScriptedChatClient::new(responses));
        let chat_client: Arc<dyn ChatClient> = Arc::clone(&chat) as Arc<dyn ChatClient>;

        let mut agent = Agent::new(
            "sys",
            registry,
            chat_client,
            DecodingConfig::default(),
            None,
        )
        .unwrap();
        let err = agent.send_message("go", None).await.unwrap_err();
        assert!(matches!(err, AgentError::RunawayLoop(n) if n == MAX_ROUNDS));
        assert_eq!(
            chat.call_count(),
            MAX_ROUNDS as usize,
            "must fail after exactly the 40th chat round, not a 41st"
        );

        // Every assistant tool-call id has a matching tool reply.
        let transcript = agent.transcript();
        let mut answered = HashSet::new();
        for message in transcript {
            if message.role == Role::Tool {
                answered.insert(message.tool_call_id.clone().unwrap());
            }
        }
        for message in transcript {
            if message.role == Role::Assistant {
                for id in message.tool_call_ids() {
                    assert!(answered.contains(id), "tool call {id} left unanswered");
                }
            }
        }
    }

    #[tokio::test]
    async fn construction_rejects_unknown_allowed_tool() {
        let registry = weather_registry();
        let chat = Arc::new(ScriptedChatClient::new(vec![]));
        let allowed: HashSet<String> = ["does_not_exist".to_string()].into_iter().collect();

        let result = Agent::new(
            "sys",
            registry,
            chat,
            DecodingConfig::default(),
            Some(allowed),
        );
        let err = match result {
            Err(e) => e,
            Ok(_) => panic!("expected construction to fail"),
        };
        assert!(matches!(err, AgentError::UnknownAllowedTool(name) if name == "does_not_exist"));
    }

    #[tokio::test]
    async fn send_message_is_idempotent_on_the_system_prompt() {
        let registry = weather_registry();
        let chat = Arc::new(ScriptedChatClient::new(vec![
            ChatMessage::assistant(Some("first".to_string()), None),
            ChatMessage::assistant(Some("second".to_string()), None),
        ]));
        let call_count_tracker = Arc::clone(&chat);

        let mut agent = Agent::new("sys", registry, chat, DecodingConfig::default(), None).unwrap();
        agent.send_message("one", None).await.unwrap();
        agent.send_message("two", None).await.unwrap();

        let system_count = agent
            .transcript()
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(system_count, 1);
        assert_eq!(agent.transcript()[0].role, Role::System);
        assert_eq!(call_count_tracker.call_count(), 2);
    }

    #[tokio::test]
    async fn clear_conversation_preserves_only_system_messages() {
        let registry = weather_registry();
        let chat = Arc::new(ScriptedChatClient::new(vec![ChatMessage::assistant(
            Some("hi".to_string()),
            None,
        )]));
        let mut agent = Agent::new("sys", registry, chat, DecodingConfig::default(), None).unwrap();
        agent.send_message("hello", None).await.unwrap();

        agent.clear_conversation();
        assert!(agent.transcript().iter().all(|m| m.role == Role::System));
    }
}
