//! Onboarding command handlers
//!
//! Submits onboarding forms and follows the background job they start.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use docflow_core::domain::onboarding::{OnboardProgress, OnboardStatus};
use docflow_core::dto::onboarding::OnboardRequest;

use super::read_json_file;
use crate::config::Config;

/// How long `--wait` follows a job before giving up
const DEFAULT_DEADLINE_SECS: u64 = 600;

/// Onboarding subcommands
#[derive(Subcommand)]
pub enum OnboardCommands {
    /// Submit an onboarding form from a JSON file
    Save {
        /// Path to the onboarding JSON
        #[arg(short, long)]
        file: String,

        /// Follow the job until it finishes
        #[arg(short, long)]
        wait: bool,

        /// Stop following after this many seconds
        #[arg(long, default_value_t = DEFAULT_DEADLINE_SECS)]
        deadline: u64,
    },
    /// Show the progress of an onboarding job
    Progress {
        /// Job ID
        job_id: String,

        /// Poll until the job finishes
        #[arg(short, long)]
        wait: bool,

        /// Poll interval in seconds
        #[arg(long, default_value = "2")]
        interval: u64,

        /// Stop polling after this many seconds
        #[arg(long, default_value_t = DEFAULT_DEADLINE_SECS)]
        deadline: u64,
    },
    /// Cancel an onboarding job
    Cancel {
        /// Job ID
        job_id: String,
    },
}

/// Handle onboarding commands
pub async fn handle_onboard_command(command: OnboardCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        OnboardCommands::Save {
            file,
            wait,
            deadline,
        } => {
            let request: OnboardRequest = read_json_file(&file)?;
            if request.app_id.trim().is_empty() {
                bail!("{}: app_id is required", file);
            }

            let job = client.save_onboarding(&request).await?;
            println!("{}", "✓ Onboarding started!".green().bold());
            println!("  Job ID: {}", job.job_id.cyan());

            if wait {
                let progress = client
                    .wait_for_onboarding(
                        &job.job_id,
                        Duration::from_secs(2),
                        Duration::from_secs(deadline),
                    )
                    .await?;
                report(&progress)?;
            }
            Ok(())
        }
        OnboardCommands::Progress {
            job_id,
            wait,
            interval,
            deadline,
        } => {
            let progress = if wait {
                client
                    .wait_for_onboarding(
                        &job_id,
                        Duration::from_secs(interval.max(1)),
                        Duration::from_secs(deadline),
                    )
                    .await?
            } else {
                client.onboarding_progress(&job_id).await?
            };
            report(&progress)
        }
        OnboardCommands::Cancel { job_id } => {
            client.cancel_onboarding(&job_id).await?;
            println!(
                "{}",
                format!("✓ Onboarding job {} cancelled", job_id).green().bold()
            );
            Ok(())
        }
    }
}

/// Print a progress report; a failed job is an error
fn report(progress: &OnboardProgress) -> Result<()> {
    let status = match progress.status {
        OnboardStatus::Completed => progress.status.to_string().green(),
        OnboardStatus::Failed | OnboardStatus::Cancelled => progress.status.to_string().red(),
        OnboardStatus::Pending | OnboardStatus::Running => progress.status.to_string().yellow(),
    };

    println!("{}", "Onboarding Progress:".bold());
    println!("  Job ID:   {}", progress.job_id.cyan());
    println!("  Status:   {}", status);
    println!("  Progress: {}%", progress.progress);
    if let Some(message) = &progress.message {
        println!("  Message:  {}", message.dimmed());
    }

    if progress.status == OnboardStatus::Failed {
        bail!("Onboarding job {} failed", progress.job_id);
    }
    Ok(())
}
