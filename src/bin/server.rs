//! CEP MCP Server
//!
//! Run with: cep-server

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cep::client::{CepClient, ClientConfig, DEFAULT_BASE_URL};
use cep::error::{CepError, Result};
use cep::handler::AddressLookupHandler;
use cep::mcp::{CepMcpHandler, McpServer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "cep-server")]
#[command(about = "MCP server for Brazilian postal code (CEP) lookups")]
#[command(version)]
struct Args {
    /// Base URL of the CEP API
    #[arg(long, env = "CEP_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    api_base_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "CEP_API_TIMEOUT_SECS", default_value = "5")]
    timeout_secs: u64,

    /// Log output format (stderr)
    #[arg(long, env = "CEP_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the protocol, so logs go to stderr
    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    if args.timeout_secs == 0 {
        return Err(CepError::Config(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    let config = ClientConfig {
        base_url: args.api_base_url,
        timeout: Duration::from_secs(args.timeout_secs),
    };
    tracing::info!(
        base_url = %config.base_url,
        timeout_secs = args.timeout_secs,
        "CEP MCP server starting..."
    );

    let client = CepClient::new(config)?;
    let server = McpServer::new(CepMcpHandler::new(AddressLookupHandler::new(client)));
    server.run().await?;

    tracing::info!("stdin closed, CEP MCP server stopped");
    Ok(())
}
