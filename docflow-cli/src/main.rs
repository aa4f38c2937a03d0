//! Docflow CLI
//!
//! Admin console for the document-processing pipeline service.

mod commands;
mod config;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "Docflow pipeline admin console", long_about = None)]
struct Cli {
    /// Pipeline service URL
    #[arg(long, env = "DOCFLOW_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "DOCFLOW_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "DOCFLOW_TIMEOUT_SECS", default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docflow_cli=info,docflow_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        token: cli.token,
        timeout_secs: cli.timeout,
    };

    if let Err(e) = handle_command(cli.command, &config).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
