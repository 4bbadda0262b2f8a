//! A long-lived MCP server subprocess, multiplexed by JSON-RPC id.
//!
//! Generalizes the single-mutex request/response MCP clients scattered
//! across the wider ecosystem (one `Mutex<Transport>` serializing every
//! call) to a concurrent-multiplexing shape: one
//! reader task demultiplexes responses against a `pending` map of
//! correlation id -> oneshot sender, so N callers can have requests
//! in flight on the same pipe at once.

use crate::jsonrpc::{self, Frame};
use crate::mcp::error::McpError;
use crate::types::ToolSpec;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::MCPServerConfig;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout used for every discovery-path request.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);
/// Settle interval after spawn, before discovery.
const SETTLE_INTERVAL: Duration = Duration::from_millis(500);
/// Bound on graceful shutdown before the subprocess is force-killed.
const DISPOSE_TIMEOUT: Duration = Duration::from_secs(2);

const FALLBACK_METHODS: &[&str] = &["list_tools", "tools.list", "get_tools", "tools/get"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum State {
    New = 0,
    Initializing = 1,
    Ready = 2,
    Disposed = 3,
}

impl State {
    fn label(self) -> &'static str {
        match self {
            State::New => "new",
            State::Initializing => "initializing",
            State::Ready => "ready",
            State::Disposed => "disposed",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => State::New,
            1 => State::Initializing,
            2 => State::Ready,
            _ => State::Disposed,
        }
    }
}

type PendingMap = HashMap<u64, oneshot::Sender<Result<Value, jsonrpc::RpcError>>>;

/// One live connection to an MCP server subprocess.
pub struct McpClient {
    name: String,
    state: AtomicU8,
    next_id: AtomicU64,
    pending: Arc<Mutex<PendingMap>>,
    writer: Mutex<Option<ChildStdin>>,
    child: Mutex<Option<Child>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    stderr_task: Mutex<Option<JoinHandle<()>>>,
    tools: RwLock<Vec<ToolSpec>>,
}

impl McpClient {
    /// Construct a not-yet-initialized client for the given server config.
    /// `name` is used only for logging and error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: AtomicU8::new(State::New as u8),
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            writer: Mutex::new(None),
            child: Mutex::new(None),
            reader_task: Mutex::new(None),
            stderr_task: Mutex::new(None),
            tools: RwLock::new(Vec::new()),
        }
    }

    fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, s: State) {
        self.state.store(s as u8, Ordering::SeqCst);
    }

    /// Spawn the subprocess, discover its tools, and transition to `ready`.
    ///
    /// Fails if spawning fails, if `initialize` was already called, or if
    /// tool discovery exhausts `tools/list` and every fallback method.
    pub async fn initialize(&self, config: &MCPServerConfig) -> Result<(), McpError> {
        if self.state() != State::New {
            return Err(McpError::AlreadyInitialized);
        }
        self.set_state(State::Initializing);

        let mut command = tokio::process::Command::new(&config.command);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &config.working_directory {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| McpError::Spawn {
            command: config.command.clone(),
            source,
        })?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let stderr = child.stderr.take().expect("piped stderr");

        *self.writer.lock().await = Some(stdin);

        let pending = Arc::clone(&self.pending);
        let server_name = self.name.clone();
        let reader = tokio::spawn(Self::read_loop(stdout, pending, server_name));
        *self.reader_task.lock().await = Some(reader);

        let server_name = self.name.clone();
        let stderr_task = tokio::spawn(Self::stderr_loop(stderr, server_name));
        *self.stderr_task.lock().await = Some(stderr_task);

        *self.child.lock().await = Some(child);

        tokio::time::sleep(SETTLE_INTERVAL).await;

        match self.discover().await {
            Ok(tools) => {
                info!(server = %self.name, count = tools.len(), "MCP tools discovered");
                *self.tools.write().await = tools;
                self.set_state(State::Ready);
                Ok(())
            }
            Err(e) => {
                self.set_state(State::Disposed);
                Err(e)
            }
        }
    }

    async fn read_loop(
        stdout: tokio::process::ChildStdout,
        pending: Arc<Mutex<PendingMap>>,
        server: String,
    ) {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Frame::Response { id, result } = jsonrpc::decode_line(&line) {
                        let sender = pending.lock().await.remove(&id);
                        if let Some(sender) = sender {
                            let _ = sender.send(result);
                        }
                        // Unmatched id: stray notification or late response
                        // to an already-timed-out call. Dropped silently.
                    }
                }
                Ok(None) => {
                    debug!(server = %server, "MCP server closed stdout");
                    break;
                }
                Err(e) => {
                    warn!(server = %server, error = %e, "MCP reader error");
                    break;
                }
            }
        }
        // EOF or error: every still-pending caller gets a disposed error by
        // virtue of their oneshot::Sender being dropped here.
        pending.lock().await.clear();
    }

    async fn stderr_loop(stderr: tokio::process::ChildStderr, server: String) {
        use std::sync::LazyLock;
        static LOG_LINE: LazyLock<regex::Regex> = LazyLock::new(|| {
            regex::Regex::new(r"^\[(?P<ts>[^\]]*)\]\s*\[(?P<level>[A-Za-z]+)\]\s*(?P<msg>.*)$")
                .unwrap()
        });

        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match LOG_LINE.captures(&line) {
                Some(caps) => {
                    let level = caps.name("level").unwrap().as_str().to_lowercase();
                    let msg = caps.name("msg").unwrap().as_str();
                    match level.as_str() {
                        "error" => tracing::error!(server = %server, "{msg}"),
                        "warn" | "warning" => tracing::warn!(server = %server, "{msg}"),
                        "info" => tracing::info!(server = %server, "{msg}"),
                        _ => tracing::debug!(server = %server, "{msg}"),
                    }
                }
                None => tracing::debug!(server = %server, "{line}"),
            }
        }
    }

    fn require_ready(&self) -> Result<(), McpError> {
        if self.state() == State::Ready {
            Ok(())
        } else {
            Err(McpError::NotReady(self.state().label()))
        }
    }

    /// Write `method`/`params` as a request and await its matching response,
    /// bounded by `timeout`. Bypasses the `ready` check — used internally
    /// both by `execute` (after checking readiness) and by discovery (which
    /// runs before the client is ready).
    async fn call_raw(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Result<Value, jsonrpc::RpcError>, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = jsonrpc::Request::call(id, method, params);
        let line =
            jsonrpc::encode_line(&request).map_err(|e| McpError::Io(std::io::Error::other(e)))?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        {
            let mut writer = self.writer.lock().await;
            let stdin = writer.as_mut().ok_or(McpError::Disposed)?;
            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                self.pending.lock().await.remove(&id);
                return Err(McpError::Io(e));
            }
            if let Err(e) = stdin.flush().await {
                self.pending.lock().await.remove(&id);
                return Err(McpError::Io(e));
            }
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_recv_error)) => Err(McpError::Disposed),
            Err(_elapsed) => {
                self.pending.lock().await.remove(&id);
                Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    async fn try_list_tools(&self, method: &str) -> Option<Vec<ToolSpec>> {
        let outcome = self
            .call_raw(method, Some(json!({})), DISCOVERY_TIMEOUT)
            .await;
        let value = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(rpc_error)) => {
                debug!(method, error = %rpc_error.message, "discovery method returned an RPC error");
                return None;
            }
            Err(e) => {
                debug!(method, error = %e, "discovery method failed");
                return None;
            }
        };

        let tools = value.get("tools")?.as_array()?;
        Some(
            tools
                .iter()
                .filter_map(|t| {
                    let name = t.get("name")?.as_str()?.to_string();
                    let description = t
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let schema = t
                        .get("inputSchema")
                        .cloned()
                        .unwrap_or_else(|| json!({"type": "object"}));
                    Some(ToolSpec::new(name, description, schema))
                })
                .collect(),
        )
    }

    async fn discover(&self) -> Result<Vec<ToolSpec>, McpError> {
        if let Some(tools) = self.try_list_tools("tools/list").await {
            return Ok(tools);
        }
        for method in FALLBACK_METHODS {
            if let Some(tools) = self.try_list_tools(method).await {
                if !tools.is_empty() {
                    return Ok(tools);
                }
            }
        }
        Err(McpError::NoToolsDiscovered {
            server: self.name.clone(),
        })
    }

    /// The tool catalogue discovered during `initialize`. Immutable after
    /// that point.
    pub async fn tools(&self) -> Vec<ToolSpec> {
        self.tools.read().await.clone()
    }

    /// Invoke `tools/call` for `name` with `arguments` (a JSON document
    /// serialized as a string, exactly as the LLM emits it) and return the
    /// concatenated text content of the result.
    pub async fn execute(
        &self,
        name: &str,
        arguments: &str,
        timeout: Option<Duration>,
    ) -> Result<String, McpError> {
        self.require_ready()?;
        let args: Value = serde_json::from_str(arguments).unwrap_or_else(|_| json!({}));
        let params = json!({ "name": name, "arguments": args });

        let outcome = self
            .call_raw(
                "tools/call",
                Some(params),
                timeout.unwrap_or(DEFAULT_TIMEOUT),
            )
            .await?;

        let result = outcome.map_err(|rpc_error| McpError::ToolFailure {
            tool: name.to_string(),
            message: rpc_error.message,
        })?;

        if result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            let message = result
                .get("content")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(|item| item.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("tool reported an error")
                .to_string();
            return Err(McpError::ToolFailure {
                tool: name.to_string(),
                message,
            });
        }

        Ok(Self::render_result(&result))
    }

    fn render_result(result: &Value) -> String {
        match result.get("content").and_then(Value::as_array) {
            Some(items) => {
                let texts: Vec<&str> = items
                    .iter()
                    .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|item| item.get("text").and_then(Value::as_str))
                    .collect();
                if texts.is_empty() {
                    result.to_string()
                } else {
                    texts.join("\n")
                }
            }
            None => result.to_string(),
        }
    }

    /// Whether the client's cached tool list is non-empty — the cheap
    /// liveness signal `ServerManager` uses.
    pub async fn is_healthy(&self) -> bool {
        self.state() == State::Ready && !self.tools.read().await.is_empty()
    }

    /// Fail every still-pending request, kill the subprocess, and stop the
    /// reader/stderr tasks. Bounded by a short grace period before force
    /// termination.
    pub async fn dispose(&self) {
        if self.state() == State::Disposed {
            return;
        }
        self.set_state(State::Disposed);

        self.pending.lock().await.clear();
        *self.writer.lock().await = None;

        if let Some(child) = self.child.lock().await.as_mut() {
            let wait = tokio::time::timeout(DISPOSE_TIMEOUT, child.wait()).await;
            if wait.is_err() {
                let _ = child.start_kill();
            }
        }

        if let Some(task) = self.reader_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.stderr_task.lock().await.take() {
            task.abort();
        }
    }
}
