//! Error types for CEP lookups

use thiserror::Error;

/// Result type alias for CEP operations
pub type Result<T> = std::result::Result<T, CepError>;

/// Failure while resolving a CEP against the upstream API.
///
/// Timeouts and caller cancellation are reported as [`LookupError::Transport`];
/// they are not distinguished from other transport failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("CEP not found")]
    NotFound,

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to execute request: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl LookupError {
    /// Transport failure from a reqwest error, keeping the underlying detail
    pub fn transport(err: reqwest::Error) -> Self {
        LookupError::Transport(err.to_string())
    }

    /// Transport failure caused by the caller's cancellation signal
    pub fn cancelled() -> Self {
        LookupError::Transport("request cancelled".to_string())
    }
}

/// Main error type for the CEP server
#[derive(Error, Debug)]
pub enum CepError {
    #[error("CEP parameter is required")]
    MissingParameter,

    #[error("CEP must be a string")]
    NotAString,

    #[error("Invalid CEP format. Expected 8 digits (e.g., 01310100 or 01310-100)")]
    InvalidFormat,

    #[error("Failed to fetch address: {0}")]
    Lookup(#[from] LookupError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),
}

impl CepError {
    /// True for errors caused by the caller's arguments; these never reach the network
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CepError::MissingParameter | CepError::NotAString | CepError::InvalidFormat
        )
    }

    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self {
            CepError::MethodNotFound(_) => -32601,
            CepError::UnknownTool(_) => -32602,
            e if e.is_input_error() => -32602,
            _ => -32000,
        }
    }
}
