//! Wires every component together against a real `DEEPSEEK_API_KEY` and an
//! optional `mcpServers` config file: `agentmcp-demo [config.json] "question"`.

use std::env;
use std::sync::Arc;

use agentmcp::agent::Agent;
use agentmcp::chat::{DecodingConfig, HttpChatClient};
use agentmcp::config::{load_mcp_servers_config, EnvironmentLoader};
use agentmcp::executor::NativeExecutor;
use agentmcp::mcp::ServerManager;
use agentmcp::registry::{FilteredRegistry, ToolCatalogue, ToolRegistry};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loader = EnvironmentLoader::new(None);
    agentmcp::logging::init(&env_loader);

    let mut args: Vec<String> = env::args().skip(1).collect();
    let config_path = if args.first().is_some_and(|a| a.ends_with(".json")) {
        Some(args.remove(0))
    } else {
        None
    };
    let question = args.join(" ");
    let question = if question.is_empty() {
        "What's the weather in Hangzhou?".to_string()
    } else {
        question
    };

    let api_key = env_loader.deepseek_api_key().unwrap_or_default();
    let base_url =
        env::var("DEEPSEEK_BASE_URL").unwrap_or_else(|_| "https://api.deepseek.com".to_string());
    let chat_client = Arc::new(HttpChatClient::new(base_url, api_key));

    let manager = Arc::new(ServerManager::new());
    let registry = Arc::new(ToolRegistry::new(Arc::clone(&manager)));

    if let Some(path) = config_path {
        let config = load_mcp_servers_config(std::path::Path::new(&path))?;
        registry.initialize_mcp(&config).await?;
    }

    registry.register(Arc::new(NativeExecutor::new(
        "get_weather",
        "Get the current weather for a city",
        json!({
            "type": "object",
            "properties": { "location": { "type": "string" } },
            "required": ["location"]
        }),
        |args| async move {
            let location = args
                .get("location")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            Ok(format!("24°C, Partly Cloudy in {location}"))
        },
    )));

    let tool_catalogue: Arc<dyn ToolCatalogue> = registry.clone();
    let filtered: Arc<dyn ToolCatalogue> = Arc::new(FilteredRegistry::new(tool_catalogue, None));

    let mut agent = Agent::new(
        "You are a helpful assistant with access to tools.",
        filtered,
        chat_client,
        DecodingConfig::default(),
        None,
    )?;

    let reply = agent.send_message(question, None).await?;
    println!("{}", reply.content.unwrap_or_default());

    registry.shutdown().await;
    Ok(())
}
