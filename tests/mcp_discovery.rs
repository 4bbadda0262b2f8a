//! Discovery falls back past `tools/list` to `list_tools` when the
//! primary method answers without a `tools` field.

use agentmcp::mcp::{MCPServerConfig, McpClient};

#[tokio::test]
async fn discovery_falls_back_to_list_tools() {
    let bin = env!("CARGO_BIN_EXE_fake_mcp_server");
    let config = MCPServerConfig::new(bin);

    let client = McpClient::new("fake-server");
    client
        .initialize(&config)
        .await
        .expect("fake server should initialize");

    let tools = client.tools().await;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "x");

    client.dispose().await;
}

#[tokio::test]
async fn execute_round_trips_arguments_through_the_subprocess() {
    let bin = env!("CARGO_BIN_EXE_fake_mcp_server");
    let config = MCPServerConfig::new(bin);

    let client = McpClient::new("fake-server");
    client
        .initialize(&config)
        .await
        .expect("fake server should initialize");

    let result = client
        .execute("x", r#"{"city":"Austin"}"#, None)
        .await
        .unwrap();
    assert_eq!(result, r#"{"city":"Austin"}"#);

    client.dispose().await;
}
