//! MCP JSON-RPC protocol implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{CepError, Result};

/// MCP JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    /// `None` only when the id member is absent; `"id": null` stays `Some(Value::Null)`
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn present_id<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl McpRequest {
    /// Notifications carry no id and never get a response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// MCP JSON-RPC response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Create error from CepError
    pub fn from_error(id: Option<Value>, err: CepError) -> Self {
        Self::error(id, err.code(), err.to_string())
    }
}

/// JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
}

/// Standard MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const CANCELLED: &str = "notifications/cancelled";
    pub const PING: &str = "ping";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
}

/// Trait for handling MCP requests.
///
/// `cancel` fires when the client sends `notifications/cancelled` for this request.
#[async_trait]
pub trait McpHandler: Send + Sync + 'static {
    async fn handle_request(&self, request: McpRequest, cancel: CancellationToken) -> McpResponse;
}

/// In-flight requests by id; the sequence number tells reused ids apart
type InFlight = Arc<DashMap<String, (u64, CancellationToken)>>;

/// Removes a request from the in-flight table when its task ends, however it ends.
///
/// Only the entry this guard registered is removed, so a later request that
/// reused the same id stays cancellable.
struct InFlightGuard {
    in_flight: InFlight,
    key: String,
    seq: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .remove_if(&self.key, |_, (seq, _)| *seq == self.seq);
    }
}

/// Key used to match `notifications/cancelled` against in-flight requests
fn request_key(id: &Value) -> String {
    id.to_string()
}

/// MCP Server handling stdio communication
pub struct McpServer<H>
where
    H: McpHandler,
{
    handler: Arc<H>,
    in_flight: InFlight,
    next_seq: AtomicU64,
}

impl<H: McpHandler> McpServer<H> {
    /// Create a new MCP server
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            in_flight: Arc::new(DashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of requests currently being handled
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Run the server, reading from stdin and writing to stdout
    pub async fn run(&self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        self.serve(stdin, &mut stdout).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, writing responses to `writer`.
    ///
    /// Requests run concurrently; responses are written in completion order.
    /// Returns once the reader hits EOF and every in-flight request has answered.
    pub async fn serve<R, W>(&self, reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<McpResponse>();
        let mut tx = Some(tx);
        let mut lines = BufReader::new(reader).lines();

        loop {
            tokio::select! {
                line = lines.next_line(), if tx.is_some() => match line {
                    Ok(Some(line)) => {
                        if let Some(ref sender) = tx {
                            self.dispatch_line(&line, sender);
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("stdin closed, draining {} in-flight request(s)", self.in_flight());
                        tx = None;
                    }
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        tx = None;
                    }
                },
                Some(response) = rx.recv() => {
                    write_response(writer, &response).await?;
                }
                else => break,
            }
        }

        Ok(())
    }

    fn dispatch_line(&self, line: &str, tx: &mpsc::UnboundedSender<McpResponse>) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        let request = match serde_json::from_str::<McpRequest>(trimmed) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Unparseable request: {}", e);
                let _ = tx.send(McpResponse::error(
                    None,
                    codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
                return;
            }
        };

        if request.method == methods::CANCELLED {
            self.cancel(&request.params);
            return;
        }

        if request.is_notification() {
            match request.method.as_str() {
                methods::INITIALIZED => tracing::info!("Client initialized"),
                other => tracing::debug!("Ignoring notification: {}", other),
            }
            return;
        }

        if request.id == Some(Value::Null) {
            tracing::warn!("Rejecting {} request with null id", request.method);
            let _ = tx.send(McpResponse::error(
                Some(Value::Null),
                codes::INVALID_REQUEST,
                "Invalid Request: id must not be null".to_string(),
            ));
            return;
        }

        let (cancel, guard) = match request.id {
            Some(ref id) => self.register(request_key(id)),
            None => return,
        };

        let handler = Arc::clone(&self.handler);
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = {
                let _guard = guard;
                handler.handle_request(request, cancel).await
            };
            let _ = tx.send(response);
        });
    }

    /// Track a request so `notifications/cancelled` can reach it.
    ///
    /// A reused id replaces the earlier entry; only the newest request with
    /// that id can be cancelled.
    fn register(&self, key: String) -> (CancellationToken, InFlightGuard) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        if self
            .in_flight
            .insert(key.clone(), (seq, cancel.clone()))
            .is_some()
        {
            tracing::warn!(request_id = %key, "Request id reused while still in flight");
        }
        let guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            key,
            seq,
        };
        (cancel, guard)
    }

    fn cancel(&self, params: &Value) {
        let Some(request_id) = params.get("requestId") else {
            tracing::debug!("Cancellation without requestId ignored");
            return;
        };

        match self.in_flight.get(&request_key(request_id)) {
            Some(entry) => {
                tracing::info!(request_id = %request_id, "Cancelling request");
                entry.1.cancel();
            }
            None => tracing::debug!(request_id = %request_id, "Cancellation for unknown request"),
        }
    }
}

async fn write_response<W>(writer: &mut W, response: &McpResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut response_json = serde_json::to_string(response)?;
    response_json.push('\n');
    writer.write_all(response_json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// MCP tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP initialize result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Name reported to hosts in `serverInfo`
pub const SERVER_NAME: &str = "Brazilian ZIP code (CEP) Lookup 🇧🇷";

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: "2024-11-05".to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: crate::VERSION.to_string(),
            },
        }
    }
}

/// Tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResult {
    /// Create a text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    /// Map a handler outcome onto a result: text on success, flagged error text otherwise
    pub fn from_outcome(outcome: Result<String>) -> Self {
        match outcome {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(e.to_string()),
        }
    }

    /// Text of the single content item
    pub fn text_content(&self) -> Option<&str> {
        self.content.first().map(|content| match content {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}
