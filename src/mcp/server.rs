//! MCP stdio server: request loop and the fault-containment boundary.
//!
//! Every tool call runs in its own task. Whatever goes wrong inside a
//! handler (an error or a panic) comes back to the client as an `isError`
//! tool result and the session continues.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio_util::sync::CancellationToken;

use crate::mcp::codec::{read_frame, write_frame, Frame};
use crate::mcp::protocol::{
    CallToolParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
    PROTOCOL_VERSION,
};
use crate::tools::{ToolDispatcher, ToolResult};
use crate::types::ServerConfig;

/// MCP server over a shared, read-only dispatcher.
#[derive(Debug)]
pub struct McpServer {
    dispatcher: Arc<ToolDispatcher>,
    config: ServerConfig,
    cancel: CancellationToken,
}

impl McpServer {
    pub fn new(dispatcher: Arc<ToolDispatcher>, config: ServerConfig) -> Self {
        Self {
            dispatcher,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Serve on the process's stdin/stdout until EOF or shutdown.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve one connection until EOF or shutdown.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            server = %self.config.name,
            tools = self.dispatcher.len(),
            "MCP server ready"
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("MCP server shutting down");
                    break;
                }
                frame = read_frame(&mut reader, self.config.max_message_bytes) => {
                    let response = match frame? {
                        None => {
                            tracing::info!("Client closed the connection");
                            break;
                        }
                        Some(Frame::TooLarge) => Some(JsonRpcResponse::failure(
                            Value::Null,
                            JsonRpcError::new(
                                INVALID_REQUEST,
                                format!("message exceeds {} bytes", self.config.max_message_bytes),
                            ),
                        )),
                        Some(Frame::Message(bytes)) => tokio::select! {
                            _ = self.cancel.cancelled() => {
                                tracing::info!("Shutdown requested; abandoning in-flight request");
                                break;
                            }
                            response = self.handle_message(&bytes) => response,
                        },
                    };

                    if let Some(response) = response {
                        let encoded = serde_json::to_value(&response)?;
                        write_frame(&mut writer, &encoded).await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Handle one raw message. Notifications produce no response.
    pub async fn handle_message(&self, bytes: &[u8]) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable message");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
                ));
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }

        self.handle_request(request).await
    }

    /// Handle one decoded request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools_result()),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {"name": self.config.name, "version": self.config.version},
        })
    }

    fn list_tools_result(&self) -> Value {
        let tools: Vec<Value> = self
            .dispatcher
            .list_definitions()
            .iter()
            .map(|d| d.to_mcp_value())
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {}", e)))?;
        let name = params.name;
        let arguments = params.arguments.unwrap_or_default();

        let dispatcher = self.dispatcher.clone();
        let task_name = name.clone();
        let handle =
            tokio::spawn(async move { dispatcher.dispatch(&task_name, arguments).await });

        let result = match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                if e.is_user_facing() {
                    tracing::warn!(tool = %name, error = %e, "Tool execution failed");
                } else {
                    tracing::error!(tool = %name, error = %e, "Tool execution failed");
                }
                ToolResult::error(format!("Error: {}", e))
            }
            Err(join_err) => {
                tracing::error!(
                    tool = %name,
                    panicked = join_err.is_panic(),
                    "Tool execution aborted"
                );
                ToolResult::error("Error: tool execution aborted unexpectedly")
            }
        };

        serde_json::to_value(&result)
            .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Encoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(Arc::new(ToolDispatcher::new()), ServerConfig::default())
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version_is_invalid_request() {
        let response = server()
            .handle_message(br#"{"jsonrpc": "1.0", "id": 4, "method": "ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, json!(4));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_method_keeps_request_id() {
        let response = server()
            .handle_message(br#"{"jsonrpc": "2.0", "id": "abc"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, json!("abc"));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_tools_list_on_empty_dispatcher() {
        let request: JsonRpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
                .unwrap();
        let response = server().handle_request(request).await.unwrap();
        assert_eq!(response.result, Some(json!({"tools": []})));
    }

    #[tokio::test]
    async fn test_null_id_request_is_answered() {
        let response = server()
            .handle_message(br#"{"jsonrpc": "2.0", "id": null, "method": "ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_call_without_arguments_reaches_dispatcher() {
        let request: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "nope"}
        }))
        .unwrap();
        let response = server().handle_request(request).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: unknown tool: nope");
    }
}
