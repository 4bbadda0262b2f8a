//! Environment variable loading.

use std::env;
use std::path::Path;

/// Loads `.env` and exposes the handful of environment variables the core
/// cares about. Provider/API-key wiring is otherwise the CLI layer's job,
/// not this crate's.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentLoader;

impl EnvironmentLoader {
    /// Load `env_file` (defaulting to `.env` in the current directory) if it
    /// exists. A missing file is not an error — most deployments rely on
    /// real environment variables instead.
    pub fn new(env_file: Option<&Path>) -> Self {
        let env_path = env_file.unwrap_or(Path::new(".env"));
        if env_path.exists() {
            if let Err(e) = dotenv::from_path(env_path) {
                tracing::warn!(error = %e, "failed to load .env file");
            }
        }
        Self
    }

    /// The API key read by the CLI/demo layer, not by the core itself.
    pub fn deepseek_api_key(&self) -> Option<String> {
        env::var("DEEPSEEK_API_KEY").ok()
    }

    /// `MCP_LOG_LEVEL`, defaulting to `info`; `MCP_DEBUG`/`MCP_VERBOSE`
    /// force `debug` regardless of what `MCP_LOG_LEVEL` says.
    pub fn mcp_log_level(&self) -> String {
        let forced_debug = ["MCP_DEBUG", "MCP_VERBOSE"]
            .iter()
            .any(|var| env::var(var).map(|v| v == "true").unwrap_or(false));
        if forced_debug {
            return "debug".to_string();
        }
        env::var("MCP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
    }
}
