//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod model;
mod onboard;
mod pipeline;
mod profile;

pub use model::ModelCommands;
pub use onboard::OnboardCommands;
pub use pipeline::PipelineCommands;
pub use profile::ProfileCommands;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::de::DeserializeOwned;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// LLM model registry
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },
    /// User profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Application onboarding
    Onboard {
        #[command(subcommand)]
        command: OnboardCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Model { command } => model::handle_model_command(command, config).await,
        Commands::Profile { command } => profile::handle_profile_command(command, config).await,
        Commands::Onboard { command } => onboard::handle_onboard_command(command, config).await,
    }
}

/// Read and parse a JSON file
pub(crate) fn read_json_file<T: DeserializeOwned>(path: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON in {}", path))
}
