//! `tracing-subscriber` initialization driven by `MCP_LOG_LEVEL` /
//! `MCP_DEBUG` / `MCP_VERBOSE`.

use tracing_subscriber::EnvFilter;

use crate::config::EnvironmentLoader;

/// Map the `MCP_LOG_LEVEL` vocabulary (`none, error, warn, info,
/// debug`) onto a tracing filter directive.
fn filter_for(level: &str) -> &'static str {
    match level {
        "none" => "off",
        "error" => "error",
        "warn" => "warn",
        "debug" => "debug",
        _ => "info",
    }
}

/// Install a global `tracing` subscriber. Safe to call once per process;
/// a second call is a no-op (the set-global-default error is swallowed).
pub fn init(env: &EnvironmentLoader) {
    let directive = filter_for(&env.mcp_log_level());
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_named_level() {
        assert_eq!(filter_for("none"), "off");
        assert_eq!(filter_for("error"), "error");
        assert_eq!(filter_for("warn"), "warn");
        assert_eq!(filter_for("info"), "info");
        assert_eq!(filter_for("debug"), "debug");
        assert_eq!(filter_for("bogus"), "info");
    }
}
