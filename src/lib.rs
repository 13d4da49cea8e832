//! CEP lookup - Brazilian postal code resolution for AI agents
//!
//! Exposes a single MCP tool, `lookup_address`, that validates a CEP,
//! queries BrasilAPI and returns a human-readable address.

pub mod client;
pub mod error;
pub mod handler;
pub mod mcp;
pub mod types;

pub use client::{CepClient, ClientConfig};
pub use error::{CepError, LookupError, Result};
pub use handler::AddressLookupHandler;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
