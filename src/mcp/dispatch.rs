//! Routes MCP methods to the address lookup handler

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::protocol::{methods, InitializeResult, McpHandler, McpRequest, McpResponse};
use super::tools::get_tool_definitions;
use crate::error::CepError;
use crate::handler::{AddressLookupHandler, TOOL_NAME};

/// MCP request handler for the CEP server
pub struct CepMcpHandler {
    lookup: AddressLookupHandler,
}

impl CepMcpHandler {
    pub fn new(lookup: AddressLookupHandler) -> Self {
        Self { lookup }
    }

    async fn handle_tool_call(
        &self,
        id: Option<Value>,
        params: &Value,
        cancel: &CancellationToken,
    ) -> McpResponse {
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");

        // Anything other than an object counts as no arguments at all
        let arguments = match params.get("arguments") {
            Some(args @ Value::Object(_)) => args.clone(),
            _ => json!({}),
        };

        match name {
            TOOL_NAME => {
                let result = self.lookup.call(&arguments, cancel).await;
                McpResponse::success(id, json!(result))
            }
            _ => McpResponse::from_error(id, CepError::UnknownTool(name.to_string())),
        }
    }
}

#[async_trait]
impl McpHandler for CepMcpHandler {
    async fn handle_request(&self, request: McpRequest, cancel: CancellationToken) -> McpResponse {
        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = InitializeResult::default();
                McpResponse::success(request.id, json!(result))
            }
            methods::PING => McpResponse::success(request.id, json!({})),
            methods::LIST_TOOLS => {
                let tools = get_tool_definitions();
                McpResponse::success(request.id, json!({"tools": tools}))
            }
            methods::CALL_TOOL => {
                self.handle_tool_call(request.id, &request.params, &cancel)
                    .await
            }
            _ => McpResponse::from_error(request.id, CepError::MethodNotFound(request.method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CepClient, ClientConfig};
    use crate::mcp::codes;
    use std::time::Duration;

    fn handler() -> CepMcpHandler {
        let client = CepClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        CepMcpHandler::new(AddressLookupHandler::new(client))
    }

    fn request(id: i64, method: &str, params: Value) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(id)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = handler()
            .handle_request(
                request(1, methods::LIST_TOOLS, Value::Null),
                CancellationToken::new(),
            )
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["tools"][0]["name"], "lookup_address");
        assert_eq!(result["tools"][0]["inputSchema"]["required"], json!(["cep"]));
    }

    #[tokio::test]
    async fn test_ping() {
        let response = handler()
            .handle_request(request(2, methods::PING, Value::Null), CancellationToken::new())
            .await;
        assert_eq!(response.result, Some(json!({})));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_call_without_arguments_reports_missing_cep() {
        for params in [
            json!({"name": "lookup_address"}),
            json!({"name": "lookup_address", "arguments": "01310100"}),
        ] {
            let response = handler()
                .handle_request(request(3, methods::CALL_TOOL, params), CancellationToken::new())
                .await;
            let result = response.result.unwrap();
            assert_eq!(result["isError"], true);
            assert_eq!(result["content"][0]["text"], "CEP parameter is required");
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let response = handler()
            .handle_request(
                request(4, methods::CALL_TOOL, json!({"name": "lookup_weather"})),
                CancellationToken::new(),
            )
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, codes::INVALID_PARAMS);
        assert_eq!(error.message, "Unknown tool: lookup_weather");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = handler()
            .handle_request(
                request(5, "resources/list", Value::Null),
                CancellationToken::new(),
            )
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, codes::METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found: resources/list");
    }
}
