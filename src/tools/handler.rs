//! Capability surface shared by every tool handler.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::tools::{ToolDefinition, ToolResult};
use crate::types::Result;

/// Arguments of one tool call.
pub type CallArguments = Map<String, Value>;

/// A named, schema-described capability.
///
/// `execute` returns `Err` only for faults the handler could not turn into a
/// user-facing text result; those are contained at the transport boundary.
#[async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, arguments: CallArguments) -> Result<ToolResult>;
}
