//! Tool dispatcher: registration table and routing by name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::tools::{CallArguments, ToolDefinition, ToolHandler, ToolResult};
use crate::types::{Error, Result};

/// Registered handlers, in registration order.
///
/// Built at startup and shared read-only afterwards.
#[derive(Debug, Default)]
pub struct ToolDispatcher {
    handlers: Vec<Arc<dyn ToolHandler>>,
    index: HashMap<String, usize>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its definition's name.
    ///
    /// A second registration under the same name replaces the first in place
    /// and returns the replaced handler.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Option<Arc<dyn ToolHandler>> {
        let name = handler.definition().name;
        match self.index.get(&name) {
            Some(&slot) => {
                tracing::warn!(tool = %name, "Tool re-registered; previous handler replaced");
                Some(std::mem::replace(&mut self.handlers[slot], handler))
            }
            None => {
                tracing::debug!(tool = %name, "Tool registered");
                self.index.insert(name, self.handlers.len());
                self.handlers.push(handler);
                None
            }
        }
    }

    /// Definitions of every registered tool, in registration order.
    pub fn list_definitions(&self) -> Vec<ToolDefinition> {
        self.handlers.iter().map(|h| h.definition()).collect()
    }

    /// Route a call to the named handler.
    ///
    /// Handler errors are returned unchanged; containment happens at the
    /// transport boundary.
    pub async fn dispatch(&self, name: &str, arguments: CallArguments) -> Result<ToolResult> {
        let handler = self
            .index
            .get(name)
            .map(|&slot| self.handlers[slot].clone())
            .ok_or_else(|| Error::unknown_tool(name))?;

        tracing::info!(tool = %name, "Dispatching tool call");
        handler.execute(arguments).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
