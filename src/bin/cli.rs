//! CEP CLI
//!
//! One-shot address lookups from the command line.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cep::client::{CepClient, ClientConfig, DEFAULT_BASE_URL};
use cep::handler::AddressLookupHandler;
use cep::mcp::get_tool_definitions;
use cep::types::{is_valid_cep, normalize_cep};

#[derive(Parser)]
#[command(name = "cep")]
#[command(about = "Brazilian postal code (CEP) lookup CLI")]
#[command(version)]
struct Cli {
    /// Base URL of the CEP API
    #[arg(long, env = "CEP_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    api_base_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "CEP_API_TIMEOUT_SECS", default_value = "5")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the address for a CEP
    Lookup {
        /// CEP, with or without hyphen
        cep: String,
    },
    /// Show the normalized form of a CEP without querying the API
    Normalize {
        /// CEP, with or without hyphen
        cep: String,
    },
    /// Print the MCP tool definitions
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lookup { cep } => {
            anyhow::ensure!(cli.timeout_secs > 0, "timeout must be at least 1 second");
            let client = CepClient::new(ClientConfig {
                base_url: cli.api_base_url,
                timeout: Duration::from_secs(cli.timeout_secs),
            })
            .context("failed to build HTTP client")?;
            let handler = AddressLookupHandler::new(client);

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            match handler.lookup(&json!({ "cep": cep }), &cancel).await {
                Ok(address) => {
                    println!("{}", address);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Normalize { cep } => {
            let normalized = normalize_cep(&cep);
            let valid = is_valid_cep(&normalized);
            println!("{} ({})", normalized, if valid { "valid" } else { "invalid" });
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Tools => {
            let tools = get_tool_definitions();
            println!(
                "{}",
                serde_json::to_string_pretty(&tools).context("failed to serialize tools")?
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
