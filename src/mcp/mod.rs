//! MCP transport: newline-delimited JSON-RPC 2.0 over stdio.

pub mod codec;
pub mod protocol;
pub mod server;

pub use server::McpServer;
