//! MCP Server
//!
//! Handles the MCP protocol over stdio, processing JSON-RPC 2.0 messages.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::handler::ToolHandler;
use crate::protocol::{
    CallToolParams, InitializeResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    ServerCapabilities, ServerInfo, ToolsCapability, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::tools::all_tools;

/// Name announced in `initialize`
pub const SERVER_NAME: &str = "todoitem-server";

/// MCP Server that communicates over stdio
pub struct McpServer {
    handler: ToolHandler,
    initialized: bool,
}

impl McpServer {
    pub fn new(handler: ToolHandler) -> Self {
        Self {
            handler,
            initialized: false,
        }
    }

    #[cfg(test)]
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server, reading from stdin and writing to stdout
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC until `input` reaches EOF
    pub async fn serve<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(input);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let bytes_read = reader.read_until(b'\n', &mut buf).await?;

            if bytes_read == 0 {
                // EOF - client disconnected
                info!("Client disconnected");
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(text) => {
                    let line = text.trim();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("Received: {}", line);
                    self.handle_message(line).await
                }
                Err(e) => {
                    error!("Dropping line that is not UTF-8: {}", e);
                    Some(JsonRpcResponse::error(
                        None,
                        PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            if let Some(resp) = response {
                let resp_str = serde_json::to_string(&resp)?;
                debug!("Sending: {}", resp_str);
                output.write_all(resp_str.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC message
    pub async fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        // Well-formed JSON that is not a request object
        let id = value.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(req) => req,
            Err(e) => {
                warn!("Invalid request: {}", e);
                return Some(JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        let id = request.id.clone();

        // Handle notifications (no id means no response expected)
        if id.is_none() {
            self.handle_notification(&request.method);
            return None;
        }

        match self.handle_request(&request.method, request.params).await {
            Ok(value) => Some(JsonRpcResponse::success(id, value)),
            Err((code, message)) => Some(JsonRpcResponse::error(id, code, message)),
        }
    }

    /// Handle a notification (no response expected)
    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" => {
                info!("Client initialized");
                self.initialized = true;
            }
            "notifications/cancelled" => {
                debug!("Request cancelled");
            }
            _ => {
                debug!("Unknown notification: {}", method);
            }
        }
    }

    /// Handle a request and return the result
    async fn handle_request(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, (i32, String)> {
        match method {
            "initialize" => self.handle_initialize(),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(params).await,
            "ping" => Ok(json!({})),
            _ => {
                warn!("Unknown method: {}", method);
                Err((METHOD_NOT_FOUND, format!("Method not found: {}", method)))
            }
        }
    }

    fn handle_initialize(&self) -> Result<Value, (i32, String)> {
        info!("Initializing MCP server");

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        serde_json::to_value(result)
            .map_err(|e| (INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }

    fn handle_list_tools(&self) -> Result<Value, (i32, String)> {
        let result = ListToolsResult { tools: all_tools() };

        serde_json::to_value(result)
            .map_err(|e| (INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, (i32, String)> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))?,
            None => return Err((INVALID_PARAMS, "Missing params".to_string())),
        };

        info!("Calling tool: {}", params.name);
        let result = self.handler.handle_tool(&params.name, params.arguments).await;

        serde_json::to_value(result)
            .map_err(|e| (INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use todoitem_core::{ApiClient, Config};
    use tokio::io::AsyncReadExt;

    fn server_for(base: &str) -> McpServer {
        let config = Config::default().with_api_base(base);
        McpServer::new(ToolHandler::new(ApiClient::new(&config).unwrap()))
    }

    fn offline_server() -> McpServer {
        server_for("http://127.0.0.1:1")
    }

    #[tokio::test]
    async fn test_initialize() {
        let mut server = offline_server();
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();

        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "todoitem-server");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_initialized_notification_has_no_response() {
        let mut server = offline_server();
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(resp.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_list_tools() {
        let mut server = offline_server();
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();

        let tools = resp.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 4);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let mut server = offline_server();

        let resp = server.handle_message("{not json").await.unwrap();
        assert_eq!(resp.error.unwrap().code, PARSE_ERROR);

        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);

        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call"}"#)
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);

        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"arguments":{}}}"#)
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_call_failure_is_a_result_not_an_error() {
        let mut server = offline_server();
        let resp = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"complete_item","arguments":{"description":"Pay rent"}}}"#,
            )
            .await
            .unwrap();

        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Item with description \"Pay rent\" not found."
        );
    }

    #[tokio::test]
    async fn test_serve_over_stream() {
        let mut backend = Server::new_async().await;
        let _items = backend
            .mock("GET", "/todoitems")
            .with_status(200)
            .with_body(r#"[{"id":5,"description":"Pay rent","todoListId":1,"isCompleted":false}]"#)
            .create_async()
            .await;
        let _delete = backend
            .mock("DELETE", "/todoitems/5")
            .with_status(204)
            .create_async()
            .await;

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"eliminar_item","arguments":{"descripcion":"pay rent"}}}"#,
            "\n",
        );

        let (mut writer, mut reader) = tokio::io::duplex(64 * 1024);
        let mut server = server_for(&backend.url());
        server.serve(input.as_bytes(), &mut writer).await.unwrap();
        drop(writer);

        let mut output = String::new();
        reader.read_to_string(&mut output).await.unwrap();

        let responses: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(
            responses[1]["result"]["content"][0]["text"],
            "Item \"Pay rent\" deleted successfully."
        );
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_invalid_request_shapes() {
        let mut server = offline_server();

        let resp = server.handle_message("[]").await.unwrap();
        let error = resp.error.unwrap();
        assert_eq!(error.code, INVALID_REQUEST);
        assert!(resp.id.is_none());

        let resp = server.handle_message(r#"{"id":1}"#).await.unwrap();
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(resp.id, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_non_utf8_line_does_not_end_session() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let (mut writer, mut reader) = tokio::io::duplex(64 * 1024);
        let mut server = offline_server();
        server.serve(input.as_slice(), &mut writer).await.unwrap();
        drop(writer);

        let mut output = String::new();
        reader.read_to_string(&mut output).await.unwrap();

        let responses: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"], json!({}));
    }
}
