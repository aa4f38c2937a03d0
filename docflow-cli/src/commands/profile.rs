//! Profile command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use docflow_core::domain::profile::UserProfile;

use crate::config::Config;

/// Profile subcommands
#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the profile behind the current token
    Me,
    /// Search profiles
    Search {
        /// Free-text query (email, name)
        query: String,
    },
}

/// Handle profile commands
pub async fn handle_profile_command(command: ProfileCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        ProfileCommands::Me => {
            let me = client.my_profile().await?;

            print_profile(&me.profile);
            let roles = if me.roles.is_empty() {
                "none".to_string()
            } else {
                me.roles.join(", ")
            };
            println!("  Roles:       {}", roles.cyan());
            println!("  Permissions:");
            for permission in &me.permissions {
                println!("    - {}", permission.dimmed());
            }
            Ok(())
        }
        ProfileCommands::Search { query } => {
            let profiles = client.search_profiles(&query).await?;

            if profiles.is_empty() {
                println!("{}", format!("No profiles match '{}'.", query).yellow());
            } else {
                println!("{}", format!("Found {} profile(s):", profiles.len()).bold());
                println!();
                for profile in &profiles {
                    print_profile(profile);
                    println!();
                }
            }
            Ok(())
        }
    }
}

fn print_profile(profile: &UserProfile) {
    println!("  {} {}", "▸".cyan(), profile.email.bold());
    if let Some(name) = &profile.display_name {
        println!("    Name:        {}", name);
    }
    println!("    ID:          {}", profile.id.as_deref().unwrap_or("-").dimmed());
    if !profile.app_ids.is_empty() {
        println!("    Apps:        {}", profile.app_ids.join(", ").dimmed());
    }
}
