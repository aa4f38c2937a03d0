//! LLM model command handlers

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use docflow_client::DocflowClient;
use docflow_client::supersede::Superseding;
use docflow_core::domain::llm_model::LlmModel;
use docflow_core::dto::llm_model::ModelSearch;
use docflow_core::validation::{ValidationErrors, parse_llm_model};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

use super::read_json_file;
use crate::config::Config;

/// Model subcommands
#[derive(Subcommand)]
pub enum ModelCommands {
    /// List registered models
    List,
    /// Get model details
    Get {
        /// Model record ID
        id: String,
    },
    /// Check a model JSON file without sending it
    Validate {
        /// Path to the model JSON
        #[arg(short, long)]
        file: String,
    },
    /// Register a model from a JSON file
    Create {
        /// Path to the model JSON
        #[arg(short, long)]
        file: String,
    },
    /// Delete a model
    Delete {
        /// Model record ID
        id: String,
    },
    /// Search models
    Search {
        /// Free-text query; omit with --interactive
        query: Option<String>,

        /// Only models of this family
        #[arg(long)]
        family: Option<String>,

        /// Only models offered by this vendor
        #[arg(long)]
        vendor: Option<String>,

        /// Read one query per line from stdin; a new line cancels the
        /// previous lookup
        #[arg(short, long)]
        interactive: bool,
    },
}

/// Handle model commands
pub async fn handle_model_command(command: ModelCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        ModelCommands::List => list_models(&client).await,
        ModelCommands::Get { id } => get_model(&client, &id).await,
        ModelCommands::Validate { file } => validate_model_file(&file),
        ModelCommands::Create { file } => create_model(&client, &file).await,
        ModelCommands::Delete { id } => delete_model(&client, &id).await,
        ModelCommands::Search {
            query,
            family,
            vendor,
            interactive,
        } => {
            let search = ModelSearch {
                query,
                family,
                vendor,
            };
            if interactive {
                interactive_search(client, search).await
            } else {
                search_models(&client, &search).await
            }
        }
    }
}

async fn list_models(client: &DocflowClient) -> Result<()> {
    let models = client.list_llm_models().await?;
    print_model_list(&models);
    Ok(())
}

async fn get_model(client: &DocflowClient, id: &str) -> Result<()> {
    let model = client.get_llm_model(id).await?;
    print_model_details(&model);
    Ok(())
}

fn validate_model_file(path: &str) -> Result<()> {
    let value: Value = read_json_file(path)?;

    match parse_llm_model(value) {
        Ok(model) => {
            println!(
                "{}",
                format!("✓ {} is a valid model record", model.model_id)
                    .green()
                    .bold()
            );
            Ok(())
        }
        Err(errors) => {
            print_field_errors(&errors);
            bail!("{} has {} invalid field(s)", path, errors.len());
        }
    }
}

async fn create_model(client: &DocflowClient, path: &str) -> Result<()> {
    let value: Value = read_json_file(path)?;

    let model = match parse_llm_model(value) {
        Ok(model) => model,
        Err(errors) => {
            print_field_errors(&errors);
            bail!("Model was not registered");
        }
    };

    let created = client.create_llm_model(&model).await?;

    println!("{}", "✓ Model registered successfully!".green().bold());
    println!(
        "  ID:       {}",
        created.id.as_deref().unwrap_or("-").cyan()
    );
    println!("  Model ID: {}", created.model_id.bold());

    Ok(())
}

async fn delete_model(client: &DocflowClient, id: &str) -> Result<()> {
    client.delete_llm_model(id).await?;

    println!(
        "{}",
        format!("✓ Model {} deleted successfully!", id).green().bold()
    );

    Ok(())
}

async fn search_models(client: &DocflowClient, search: &ModelSearch) -> Result<()> {
    let models = client.search_llm_models(search).await?;
    print_model_list(&models);
    Ok(())
}

/// Search as you type: each stdin line starts a lookup and cancels the
/// previous one, so only the latest query prints results
async fn interactive_search(client: DocflowClient, filters: ModelSearch) -> Result<()> {
    let client = Arc::new(client);
    let gate = Arc::new(Superseding::new());
    let mut lookups = JoinSet::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let query = line.trim().to_string();
        if query.is_empty() {
            continue;
        }

        let search = ModelSearch {
            query: Some(query.clone()),
            ..filters.clone()
        };
        let client = Arc::clone(&client);
        let gate = Arc::clone(&gate);

        lookups.spawn(async move {
            let lookup = async move { client.search_llm_models(&search).await };
            match gate.run(lookup).await {
                Ok(Some(models)) => {
                    println!("{}", format!("Results for '{}':", query).bold());
                    print_model_list(&models);
                }
                Ok(None) => tracing::debug!("Lookup for '{}' superseded", query),
                Err(e) => eprintln!("{} {}", "✗".red().bold(), e),
            }
        });
    }

    while lookups.join_next().await.is_some() {}

    Ok(())
}

fn print_field_errors(errors: &ValidationErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {} {}", format!("{}:", field).red(), message);
    }
}

fn print_model_list(models: &[LlmModel]) {
    if models.is_empty() {
        println!("{}", "No models found.".yellow());
        return;
    }

    println!("{}", format!("Found {} model(s):", models.len()).bold());
    println!();
    for model in models {
        println!("  {} {}", "▸".cyan(), model.model_id.bold());
        println!(
            "    ID:      {}",
            model.id.as_deref().unwrap_or("-").dimmed()
        );
        println!("    Name:    {}", model.name.dimmed());
        println!("    Family:  {}", model.family.dimmed());
        println!("    Version: {}", model.version.dimmed());
        println!();
    }
}

fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_model_details(model: &LlmModel) {
    println!("{}", "Model Details:".bold());
    println!("  ID:          {}", model.id.as_deref().unwrap_or("-").cyan());
    println!("  Model ID:    {}", model.model_id.bold());
    println!("  Name:        {}", model.name);
    println!("  Family:      {}", model.family);
    println!("  Version:     {}", model.version);
    if let Some(cutoff) = model.knowledge_cutoff_date {
        println!("  Cutoff:      {}", cutoff.format("%Y-%m-%d"));
    }
    if !model.description.is_empty() {
        println!("  Description: {}", model.description);
    }

    if !model.burndown_rates.is_empty() {
        println!("\n{}", "Burndown rates:".bold());
        for (class, rate) in &model.burndown_rates {
            println!("  {:<12} {}", class, rate);
        }
    }

    if !model.lifecycle.is_empty() {
        println!("\n{}", "Lifecycle:".bold());
        for (vendor, window) in &model.lifecycle {
            println!(
                "  {:<12} {} → {}",
                vendor,
                or_dash(window.available_date),
                or_dash(window.sunset_date)
            );
        }
    }

    if !model.provisioned_throughput.is_empty() {
        println!("\n{}", "Provisioned throughput:".bold());
        for pt in &model.provisioned_throughput {
            println!("  {:<16} {} GSU", pt.region, pt.gsu);
        }
    }
}
