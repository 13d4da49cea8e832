//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC over stdio for AI tool integration.

pub mod dispatch;
pub mod protocol;
pub mod tools;

pub use dispatch::CepMcpHandler;
pub use protocol::{
    codes, methods, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer,
    ToolCallResult, ToolContent, ToolDefinition,
};
pub use tools::{get_tool_definitions, TOOL_DEFINITIONS};
