//! Tool registry and composable allow-list view.

mod error;
mod filtered;
mod registry;

pub use error::{RegistryError, RegistryResult};
pub use filtered::FilteredRegistry;
pub use registry::ToolRegistry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::executor::ToolExecutor;
use crate::types::{ToolCall, ToolSpec};

/// Shared behavior of [`ToolRegistry`] and [`FilteredRegistry`]: a named
/// index of tool executors plus dispatch. The filtered view delegates every
/// method to a source implementing this trait rather than copying storage,
/// so that registering a new MCP tool is visible through every filtered view
/// over the same registry.
#[async_trait]
pub trait ToolCatalogue: Send + Sync {
    /// Catalogue entries for every currently registered tool.
    fn list_tools(&self) -> Vec<ToolSpec>;

    /// The executor that would service `call`, if any.
    fn find(&self, call: &ToolCall) -> Option<Arc<dyn ToolExecutor>>;

    /// Dispatch `call` to its executor, or fail if none is registered /
    /// permitted.
    async fn execute(&self, call: &ToolCall, timeout: Option<Duration>) -> RegistryResult<String>;

    /// Add or replace the executor registered under its own name.
    fn register(&self, executor: Arc<dyn ToolExecutor>);

    /// Drop every registered executor.
    fn clear(&self);
}
