//! BrasilAPI CEP client
//!
//! A single bounded GET per lookup:
//! `GET {base_url}/api/cep/v1/{cep}` with an overall request timeout.
//! The caller's cancellation token races the request; whichever of
//! cancellation, timeout or completion comes first decides the outcome.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::error::{LookupError, Result};
use crate::types::{AddressRecord, Cep};

/// Public BrasilAPI host
pub const DEFAULT_BASE_URL: &str = "https://brasilapi.com.br";

/// Path prefix of the CEP v1 endpoint; the 8-digit code is appended
pub const CEP_PATH: &str = "/api/cep/v1/";

/// Overall timeout for one upstream request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// CEP API client.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct CepClient {
    client: reqwest::Client,
    base_url: String,
}

impl CepClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cep-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Request URL for a CEP
    pub fn url_for(&self, cep: &Cep) -> String {
        format!("{}{}{}", self.base_url, CEP_PATH, cep)
    }

    /// Fetch the address for a CEP.
    ///
    /// Cancellation is checked first, so an already-cancelled token never
    /// issues a request.
    pub async fn fetch_address(
        &self,
        cep: &Cep,
        cancel: &CancellationToken,
    ) -> std::result::Result<AddressRecord, LookupError> {
        let url = self.url_for(cep);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(cep = %cep, "CEP lookup cancelled by caller");
                Err(LookupError::cancelled())
            }
            result = self.get_address(&url) => result,
        }
    }

    async fn get_address(&self, url: &str) -> std::result::Result<AddressRecord, LookupError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(LookupError::transport)?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound);
        }

        if !status.is_success() {
            let body = body_or_read_error(response.text().await);
            tracing::warn!(status = status.as_u16(), "CEP API returned an error status");
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(LookupError::transport)?;
        serde_json::from_str(&body).map_err(|e| LookupError::Decode(e.to_string()))
    }
}

/// Error body text, or the read failure in its place so the status message keeps a reason
fn body_or_read_error<E: std::fmt::Display>(body: std::result::Result<String, E>) -> String {
    body.unwrap_or_else(|e| {
        tracing::debug!("failed to read error body: {}", e);
        format!("<unreadable body: {}>", e)
    })
}
