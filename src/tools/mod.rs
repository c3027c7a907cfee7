//! Tool infrastructure: definitions, results, the handler trait, and dispatch.

pub mod definition;
pub mod dispatcher;
pub mod handler;
pub mod result;

pub use definition::{ParamDef, ParamType, ToolDefinition};
pub use dispatcher::ToolDispatcher;
pub use handler::{CallArguments, ToolHandler};
pub use result::{ContentBlock, ToolResult};
