//! Pipeline command handlers
//!
//! Handles all pipeline-related CLI commands including listing, viewing,
//! rendering the task graph, upserting, deleting and editing single tasks.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::*;
use docflow_core::domain::pipeline::Pipeline;
use docflow_core::domain::task::{Task, TaskPayload};
use docflow_core::dto::pipeline::PipelineFilters;
use docflow_core::editor::{ModuleEdit, PayloadEdit, PromptEdit, RemoteEdit, TaskEdit, merge};
use docflow_core::graph::{EMPTY_PLACEHOLDER, derive_graph};
use docflow_core::validation::ValidationErrors;

use super::read_json_file;
use crate::config::Config;
use docflow_client::DocflowClient;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// List pipelines
    List {
        /// Only pipelines of this application
        #[arg(long)]
        app_id: Option<String>,

        /// Only pipelines carrying these labels (comma-separated)
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,
    },
    /// Get pipeline details
    Get {
        /// Pipeline ID
        id: String,
    },
    /// Render the task graph of a pipeline
    Graph {
        /// Pipeline ID
        id: String,
    },
    /// Delete a pipeline
    Delete {
        /// Pipeline ID
        id: String,
    },
    /// Create or update a pipeline from a JSON file (matched by key)
    Upsert {
        /// Path to the pipeline JSON
        #[arg(short, long)]
        file: String,
    },
    /// Edit one task and save the pipeline
    SetTask {
        /// Pipeline ID
        id: String,

        /// ID of the task to edit
        task_id: String,

        #[command(flatten)]
        edit: TaskEditArgs,
    },
}

/// Task form fields; only the flags given are changed
#[derive(Args, Debug, Default)]
pub struct TaskEditArgs {
    /// Fan out over this field
    #[arg(long, conflicts_with = "clear_for_each")]
    for_each: Option<String>,

    /// Remove the fan-out marker
    #[arg(long)]
    clear_for_each: bool,

    /// Module type (module tasks)
    #[arg(long)]
    module_type: Option<String>,

    /// Module context as JSON (module tasks)
    #[arg(long)]
    context: Option<String>,

    /// Model ID (prompt tasks)
    #[arg(long)]
    model: Option<String>,

    /// Prompt text (prompt tasks)
    #[arg(long)]
    prompt: Option<String>,

    /// Sampling temperature, 0-2 (prompt tasks)
    #[arg(long)]
    temperature: Option<String>,

    /// Output token limit (prompt tasks)
    #[arg(long)]
    max_output_tokens: Option<String>,

    /// Endpoint URL (remote tasks)
    #[arg(long)]
    url: Option<String>,

    /// HTTP method (remote tasks)
    #[arg(long)]
    method: Option<String>,

    /// Headers as a JSON object (remote tasks)
    #[arg(long)]
    headers: Option<String>,

    /// Timeout in seconds (remote tasks)
    #[arg(long)]
    timeout: Option<String>,
}

impl TaskEditArgs {
    /// Build the form submission for the given flags
    ///
    /// Flags belonging to more than one task type are refused outright; flags
    /// for the wrong type are left for [`merge`] to report.
    fn to_edit(&self) -> Result<TaskEdit> {
        let for_each = if self.clear_for_each {
            Some(None)
        } else {
            self.for_each.clone().map(Some)
        };

        let module = (self.module_type.is_some() || self.context.is_some()).then(|| {
            PayloadEdit::Module(ModuleEdit {
                module_type: self.module_type.clone(),
                context: self.context.clone(),
            })
        });
        let prompt = (self.model.is_some()
            || self.prompt.is_some()
            || self.temperature.is_some()
            || self.max_output_tokens.is_some())
        .then(|| {
            PayloadEdit::Prompt(PromptEdit {
                model: self.model.clone(),
                prompt: self.prompt.clone(),
                system_instructions: None,
                max_output_tokens: self.max_output_tokens.clone(),
                temperature: self.temperature.clone(),
            })
        });
        let remote = (self.url.is_some()
            || self.method.is_some()
            || self.headers.is_some()
            || self.timeout.is_some())
        .then(|| {
            PayloadEdit::Remote(RemoteEdit {
                url: self.url.clone(),
                method: self.method.clone(),
                headers: self.headers.clone(),
                timeout: self.timeout.clone(),
            })
        });

        let mut sections: Vec<PayloadEdit> = [module, prompt, remote].into_iter().flatten().collect();
        if sections.len() > 1 {
            let kinds: Vec<&str> = sections.iter().map(|s| s.kind().as_str()).collect();
            bail!("Flags for several task types given: {}", kinds.join(", "));
        }

        Ok(TaskEdit {
            for_each,
            payload: sections.pop(),
        })
    }
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The pipeline command to execute
/// * `config` - The CLI configuration
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        PipelineCommands::List { app_id, labels } => {
            list_pipelines(&client, PipelineFilters { app_id, labels }).await
        }
        PipelineCommands::Get { id } => get_pipeline(&client, &id).await,
        PipelineCommands::Graph { id } => show_graph(&client, &id).await,
        PipelineCommands::Delete { id } => delete_pipeline(&client, &id).await,
        PipelineCommands::Upsert { file } => upsert_pipeline(&client, &file).await,
        PipelineCommands::SetTask { id, task_id, edit } => {
            set_task(&client, &id, &task_id, &edit).await
        }
    }
}

/// List pipelines matching the filters
async fn list_pipelines(client: &DocflowClient, filters: PipelineFilters) -> Result<()> {
    let pipelines = client.list_pipelines(&filters).await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} pipeline(s):", pipelines.len()).bold()
        );
        println!();
        for pipeline in pipelines {
            print_pipeline_summary(&pipeline);
        }
    }

    Ok(())
}

/// Get and display a single pipeline
async fn get_pipeline(client: &DocflowClient, id: &str) -> Result<()> {
    let pipeline = client.get_pipeline(id).await?;

    print_pipeline_details(&pipeline);

    Ok(())
}

/// Render the task graph of a pipeline
async fn show_graph(client: &DocflowClient, id: &str) -> Result<()> {
    let pipeline = client.get_pipeline(id).await?;
    let graph = derive_graph(&pipeline.tasks);

    println!("{}", pipeline.name.bold());
    if graph.is_empty() {
        println!("  {}", EMPTY_PLACEHOLDER.yellow());
    } else {
        println!("{}", graph.render_text());
    }

    Ok(())
}

/// Delete a pipeline
async fn delete_pipeline(client: &DocflowClient, id: &str) -> Result<()> {
    client.delete_pipeline(id).await?;

    println!(
        "{}",
        format!("✓ Pipeline {} deleted successfully!", id)
            .green()
            .bold()
    );

    Ok(())
}

/// Create or update a pipeline from a JSON file
async fn upsert_pipeline(client: &DocflowClient, path: &str) -> Result<()> {
    let pipeline: Pipeline = read_json_file(path)?;

    let duplicates = pipeline.duplicate_task_ids();
    if !duplicates.is_empty() {
        bail!("Duplicate task ids in {}: {}", path, duplicates.join(", "));
    }

    let saved = client.upsert_pipeline(&pipeline).await?;

    println!("{}", "✓ Pipeline saved successfully!".green().bold());
    println!(
        "  ID:    {}",
        saved.id.as_deref().unwrap_or("-").cyan()
    );
    println!("  Key:   {}", saved.key);
    println!("  Tasks: {}", saved.tasks.len().to_string().dimmed());

    Ok(())
}

/// Apply a task form to one task and resend the pipeline
async fn set_task(
    client: &DocflowClient,
    id: &str,
    task_id: &str,
    args: &TaskEditArgs,
) -> Result<()> {
    let edit = args.to_edit()?;

    let pipeline = client.get_pipeline(id).await?;
    let original = pipeline
        .task(task_id)
        .with_context(|| format!("Pipeline {} has no task '{}'", id, task_id))?;

    let edited = match merge(original, &edit) {
        Ok(task) => task,
        Err(errors) => {
            print_field_errors(&errors);
            bail!("Task '{}' was not saved", task_id);
        }
    };

    if &edited == original {
        println!("{}", "Nothing to change.".yellow());
        return Ok(());
    }

    let saved = client.replace_task(id, edited).await?;

    println!(
        "{}",
        format!("✓ Task {} updated successfully!", task_id)
            .green()
            .bold()
    );
    if let Some(task) = saved.task(task_id) {
        print_task(task);
    }

    Ok(())
}

fn print_field_errors(errors: &ValidationErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {} {}", format!("{}:", field).red(), message);
    }
}

/// Print a pipeline summary
fn print_pipeline_summary(pipeline: &Pipeline) {
    let status = if pipeline.is_active() {
        "active".green()
    } else {
        "inactive".dimmed()
    };
    println!("  {} {} [{}]", "▸".cyan(), pipeline.name.bold(), status);
    println!(
        "    ID:      {}",
        pipeline.id.as_deref().unwrap_or("-").dimmed()
    );
    println!("    Key:     {}", pipeline.key.dimmed());
    if let Some(app_id) = &pipeline.app_id {
        println!("    App:     {}", app_id.dimmed());
    }
    if let Some(labels) = pipeline.labels.as_ref().filter(|l| !l.is_empty()) {
        println!("    Labels:  {}", labels.join(", ").dimmed());
    }
    println!("    Tasks:   {}", pipeline.tasks.len().to_string().dimmed());
    println!();
}

/// Print detailed pipeline information
fn print_pipeline_details(pipeline: &Pipeline) {
    println!("{}", "Pipeline Details:".bold());
    println!(
        "  ID:          {}",
        pipeline.id.as_deref().unwrap_or("-").cyan()
    );
    println!("  Name:        {}", pipeline.name.bold());
    println!("  Key:         {}", pipeline.key);
    if let Some(version) = &pipeline.version {
        println!("  Version:     {}", version);
    }
    if let Some(scope) = &pipeline.scope {
        println!("  Scope:       {}", scope);
    }
    println!("  Active:      {}", pipeline.is_active());
    if let Some(app_id) = &pipeline.app_id {
        println!("  App:         {}", app_id);
    }
    if let Some(created_at) = &pipeline.created_at {
        println!(
            "  Created:     {} by {}",
            created_at,
            pipeline.created_by.as_deref().unwrap_or("unknown")
        );
    }
    if let Some(modified_at) = &pipeline.modified_at {
        println!(
            "  Modified:    {} by {}",
            modified_at,
            pipeline.modified_by.as_deref().unwrap_or("unknown")
        );
    }

    println!("\n{}", "Tasks:".bold());
    println!("{}", "─".repeat(80).dimmed());
    for task in &pipeline.tasks {
        print_task(task);
    }
    println!("{}", "─".repeat(80).dimmed());
}

fn print_task(task: &Task) {
    println!("  {} ({})", task.id.cyan(), task.kind().label());
    if let Some(field) = task.for_each() {
        println!("    for each: {}", field.dimmed());
    }
    if let TaskPayload::Prompt(spec) = &task.payload {
        if let Some(model) = &spec.model {
            println!("    model:    {}", model.dimmed());
        }
    }
}
