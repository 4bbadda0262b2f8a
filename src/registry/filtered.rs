//! Composable allow-list view over a [`ToolCatalogue`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::executor::ToolExecutor;
use crate::types::{ToolCall, ToolSpec};

use super::{RegistryError, RegistryResult, ToolCatalogue};

/// Restricts discovery and execution to `allowed`, without copying the
/// source's storage. `allowed = None` is the identity view (everything the
/// source exposes); `allowed = Some(∅)` hides everything.
///
/// This is a view, not a scope: `register` and `clear` delegate straight to
/// the source, so registering a new MCP tool through one filtered view is
/// visible through every other view over the same source.
pub struct FilteredRegistry {
    source: Arc<dyn ToolCatalogue>,
    allowed: Option<HashSet<String>>,
}

impl FilteredRegistry {
    pub fn new(source: Arc<dyn ToolCatalogue>, allowed: Option<HashSet<String>>) -> Self {
        Self { source, allowed }
    }

    fn permits(&self, name: &str) -> bool {
        match &self.allowed {
            None => true,
            Some(set) => set.contains(name),
        }
    }
}

#[async_trait]
impl ToolCatalogue for FilteredRegistry {
    fn list_tools(&self) -> Vec<ToolSpec> {
        match &self.allowed {
            None => self.source.list_tools(),
            Some(_) => self
                .source
                .list_tools()
                .into_iter()
                .filter(|spec| self.permits(&spec.name))
                .collect(),
        }
    }

    fn find(&self, call: &ToolCall) -> Option<Arc<dyn ToolExecutor>> {
        if !self.permits(&call.function.name) {
            return None;
        }
        self.source.find(call)
    }

    async fn execute(&self, call: &ToolCall, timeout: Option<Duration>) -> RegistryResult<String> {
        if !self.permits(&call.function.name) {
            return Err(RegistryError::AccessDenied(call.function.name.clone()));
        }
        self.source.execute(call, timeout).await
    }

    fn register(&self, executor: Arc<dyn ToolExecutor>) {
        self.source.register(executor);
    }

    fn clear(&self) {
        self.source.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::NativeExecutor;
    use crate::mcp::ServerManager;
    use crate::registry::ToolRegistry;
    use crate::types::FunctionCall;
    use serde_json::json;

    fn make_call(name: &str) -> ToolCall {
        ToolCall {
            id: "c1".to_string(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: "{}".to_string(),
            },
        }
    }

    fn source_with_two_tools() -> Arc<ToolRegistry> {
        let registry = Arc::new(ToolRegistry::new(Arc::new(ServerManager::new())));
        registry.register(Arc::new(NativeExecutor::new(
            "a",
            "",
            json!({}),
            |_| async move { Ok("a".to_string()) },
        )));
        registry.register(Arc::new(NativeExecutor::new(
            "b",
            "",
            json!({}),
            |_| async move { Ok("b".to_string()) },
        )));
        registry
    }

    #[test]
    fn none_allowed_is_identity() {
        let source = source_with_two_tools();
        let filtered = FilteredRegistry::new(source, None);
        assert_eq!(filtered.list_tools().len(), 2);
    }

    #[test]
    fn empty_allow_set_hides_everything() {
        let source = source_with_two_tools();
        let filtered = FilteredRegistry::new(source, Some(HashSet::new()));
        assert!(filtered.list_tools().is_empty());
        assert!(filtered.find(&make_call("a")).is_none());
    }

    #[tokio::test]
    async fn execute_outside_allow_set_is_access_denied() {
        let source = source_with_two_tools();
        let allowed: HashSet<String> = ["a".to_string()].into_iter().collect();
        let filtered = FilteredRegistry::new(source, Some(allowed));

        assert_eq!(filtered.execute(&make_call("a"), None).await.unwrap(), "a");
        let err = filtered.execute(&make_call("b"), None).await.unwrap_err();
        assert!(matches!(err, RegistryError::AccessDenied(name) if name == "b"));
    }

    #[test]
    fn register_delegates_to_source() {
        let source = source_with_two_tools();
        let filtered = FilteredRegistry::new(Arc::clone(&source) as Arc<dyn ToolCatalogue>, None);
        filtered.register(Arc::new(NativeExecutor::new(
            "c",
            "",
            json!({}),
            |_| async move { Ok(String::new()) },
        )));
        assert_eq!(source.list_tools().len(), 3);
    }
}
