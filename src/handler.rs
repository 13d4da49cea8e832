//! `lookup_address` tool handler
//!
//! Validates the `cep` argument, resolves it through [`CepClient`] and renders
//! the address. Every outcome, including failures, is returned to the host as
//! a [`ToolCallResult`]; nothing is propagated as a protocol fault.

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::CepClient;
use crate::error::{CepError, Result};
use crate::mcp::ToolCallResult;
use crate::types::{format_address, Cep};

/// Tool name exposed to MCP hosts
pub const TOOL_NAME: &str = "lookup_address";

/// Name of the single tool argument
pub const CEP_PARAM: &str = "cep";

/// Pull the raw `cep` string out of the tool arguments
pub fn extract_cep(arguments: &Value) -> Result<&str> {
    match arguments.get(CEP_PARAM) {
        None => Err(CepError::MissingParameter),
        Some(value) => value.as_str().ok_or(CepError::NotAString),
    }
}

/// Stateless handler for address lookups.
///
/// Holds only the shared HTTP client, so concurrent calls never observe
/// each other.
#[derive(Debug, Clone)]
pub struct AddressLookupHandler {
    client: CepClient,
}

impl AddressLookupHandler {
    pub fn new(client: CepClient) -> Self {
        Self { client }
    }

    /// Run a lookup and return the formatted address.
    ///
    /// Input errors are detected before any network access.
    pub async fn lookup(&self, arguments: &Value, cancel: &CancellationToken) -> Result<String> {
        let raw = extract_cep(arguments)?;
        let cep = Cep::parse(raw)?;

        tracing::debug!(cep = %cep, "looking up CEP");
        let address = self.client.fetch_address(&cep, cancel).await?;

        Ok(format_address(&address))
    }

    /// Run a lookup and map the outcome onto a tool result
    pub async fn call(&self, arguments: &Value, cancel: &CancellationToken) -> ToolCallResult {
        let outcome = self.lookup(arguments, cancel).await;
        if let Err(ref e) = outcome {
            if e.is_input_error() {
                tracing::debug!("rejected {} call: {}", TOOL_NAME, e);
            } else {
                tracing::warn!("{} failed: {}", TOOL_NAME, e);
            }
        }
        ToolCallResult::from_outcome(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::mcp::ToolContent;
    use serde_json::json;
    use std::time::Duration;

    // Input errors never reach the network, so an unreachable host is fine here
    fn offline_handler() -> AddressLookupHandler {
        let client = CepClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        AddressLookupHandler::new(client)
    }

    fn error_text(result: &ToolCallResult) -> &str {
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);
        match &result.content[0] {
            ToolContent::Text { text } => text.as_str(),
        }
    }

    #[test]
    fn test_extract_cep() {
        assert_eq!(extract_cep(&json!({"cep": "01310-100"})).unwrap(), "01310-100");
        assert!(matches!(
            extract_cep(&json!({})),
            Err(CepError::MissingParameter)
        ));
        assert!(matches!(
            extract_cep(&json!({"cep": 1310100})),
            Err(CepError::NotAString)
        ));
        assert!(matches!(
            extract_cep(&json!({"cep": null})),
            Err(CepError::NotAString)
        ));
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let result = offline_handler()
            .call(&json!({}), &CancellationToken::new())
            .await;
        assert_eq!(error_text(&result), "CEP parameter is required");
    }

    #[tokio::test]
    async fn test_non_string_parameter() {
        let result = offline_handler()
            .call(&json!({"cep": ["01310100"]}), &CancellationToken::new())
            .await;
        assert_eq!(error_text(&result), "CEP must be a string");
    }

    #[tokio::test]
    async fn test_invalid_format() {
        let handler = offline_handler();
        for raw in ["1231000", "123100001", "", "abc"] {
            let result = handler
                .call(&json!({"cep": raw}), &CancellationToken::new())
                .await;
            assert_eq!(
                error_text(&result),
                "Invalid CEP format. Expected 8 digits (e.g., 01310100 or 01310-100)"
            );
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_lookup_failure() {
        let result = offline_handler()
            .call(&json!({"cep": "01310-100"}), &CancellationToken::new())
            .await;
        assert!(error_text(&result).starts_with("Failed to fetch address: failed to execute request:"));
    }
}
