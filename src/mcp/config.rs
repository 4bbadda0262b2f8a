//! MCP server spawn configuration and its canonical dedup key.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// How to spawn one MCP server subprocess.
#[derive(Debug, Clone, Deserialize)]
pub struct MCPServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(rename = "workingDirectory", default)]
    pub working_directory: Option<PathBuf>,
}

impl MCPServerConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            working_directory: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_working_directory(mut self, dir: PathBuf) -> Self {
        self.working_directory = Some(dir);
        self
    }

    /// The deterministic string two configs share a subprocess under
    /// `(command, space-joined args, pipe-joined "K=V" env,
    /// workingDirectory)`.
    pub fn canonical_key(&self) -> String {
        let args = self.args.join(" ");

        let mut env_pairs: Vec<String> = self.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
        env_pairs.sort();
        let env = env_pairs.join("|");

        let cwd = self
            .working_directory
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        format!("{}\u{1}{}\u{1}{}\u{1}{}", self.command, args, env, cwd)
    }
}
