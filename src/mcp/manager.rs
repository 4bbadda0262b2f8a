//! Dedup/refcount/health-check registry over live MCP clients.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::client::McpClient;
use super::config::MCPServerConfig;

struct ManagerEntry {
    client: Arc<McpClient>,
    ref_count: usize,
}

/// A snapshot row for one live entry, returned by [`ServerManager::status`].
#[derive(Debug, Clone)]
pub struct EntryStatus {
    pub ref_count: usize,
    pub tool_count: usize,
}

/// Shares one MCP client subprocess across every caller whose config hashes
/// to the same canonical key, refcounting its lifetime.
pub struct ServerManager {
    entries: tokio::sync::Mutex<HashMap<String, ManagerEntry>>,
}

impl ServerManager {
    pub fn new() -> Self {
        Self {
            entries: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Return a client for `config`, spawning one if none exists yet or if
    /// the existing one failed its health check. Increments the entry's
    /// refcount either way.
    pub async fn acquire(
        &self,
        config: &MCPServerConfig,
    ) -> Result<Arc<McpClient>, super::error::McpError> {
        let key = config.canonical_key();
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(&key) {
            if entry.client.is_healthy().await {
                entries.get_mut(&key).unwrap().ref_count += 1;
                return Ok(Arc::clone(&entries.get(&key).unwrap().client));
            }
            let stale = entries.remove(&key).unwrap();
            drop(entries);
            stale.client.dispose().await;
            entries = self.entries.lock().await;
        }

        let client = Arc::new(McpClient::new(key.clone()));
        client.initialize(config).await?;
        entries.insert(
            key,
            ManagerEntry {
                client: Arc::clone(&client),
                ref_count: 1,
            },
        );
        Ok(client)
    }

    /// Release one reference to the client acquired for `config`. Only acts
    /// if `client` is the same instance the manager currently holds for that
    /// key — a stale reference from a since-recreated entry is a no-op.
    pub async fn release(&self, config: &MCPServerConfig, client: &Arc<McpClient>) {
        let key = config.canonical_key();
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(&key) else {
            return;
        };
        if !Arc::ptr_eq(&entry.client, client) {
            return;
        }

        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            let entry = entries.remove(&key).unwrap();
            drop(entries);
            entry.client.dispose().await;
        }
    }

    /// Dispose and remove every entry, regardless of refcount.
    pub async fn shutdown_all(&self) {
        let drained: Vec<ManagerEntry> =
            self.entries.lock().await.drain().map(|(_, v)| v).collect();
        debug!(
            count = drained.len(),
            "shutting down all MCP server entries"
        );
        for entry in drained {
            entry.client.dispose().await;
        }
    }

    /// Snapshot of every live entry's refcount and discovered tool count.
    pub async fn status(&self) -> HashMap<String, EntryStatus> {
        let entries = self.entries.lock().await;
        let mut out = HashMap::with_capacity(entries.len());
        for (key, entry) in entries.iter() {
            out.insert(
                key.clone(),
                EntryStatus {
                    ref_count: entry.ref_count,
                    tool_count: entry.client.tools().await.len(),
                },
            );
        }
        out
    }
}

impl Default for ServerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_on_same_config_dedupes() {
        // Config pointing at a command that will fail to spawn is enough to
        // exercise key computation; actual spawn/health behavior is covered
        // by mcp::client's own tests and the fake-server integration tests.
        let manager = ServerManager::new();
        let a = MCPServerConfig::new("/bin/does-not-exist-xyz");
        let b = MCPServerConfig::new("/bin/does-not-exist-xyz");
        assert_eq!(a.canonical_key(), b.canonical_key());

        let err_a = manager.acquire(&a).await;
        assert!(err_a.is_err());
        let status = manager.status().await;
        assert!(status.is_empty());
    }
}
