//! Pipeline-related API endpoints

use crate::DocflowClient;
use crate::error::{ClientError, Result};
use docflow_core::domain::pipeline::{Pipeline, duplicate_task_ids, splice_task, splice_tasks};
use docflow_core::domain::task::{JsonMap, Task};
use docflow_core::dto::pipeline::PipelineFilters;
use reqwest::Method;
use tracing::info;

const PIPELINES_PATH: &str = "/api/v1/pipelines";

impl DocflowClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// List pipelines, optionally filtered by application and labels
    pub async fn list_pipelines(&self, filters: &PipelineFilters) -> Result<Vec<Pipeline>> {
        let response = self
            .request(Method::GET, PIPELINES_PATH, &[])?
            .query(&filters.to_query())
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a pipeline by ID
    pub async fn get_pipeline(&self, pipeline_id: &str) -> Result<Pipeline> {
        let record = self.get_pipeline_record(pipeline_id).await?;

        serde_json::from_value(record.into())
            .map_err(|e| ClientError::ParseError(format!("Failed to parse pipeline: {}", e)))
    }

    /// Get a pipeline by ID as the untyped JSON object the service stores
    pub async fn get_pipeline_record(&self, pipeline_id: &str) -> Result<JsonMap> {
        let response = self
            .request(Method::GET, PIPELINES_PATH, &[pipeline_id])?
            .send()
            .await?;

        self.handle_response(response).await.map_err(|e| {
            if e.is_not_found() {
                ClientError::NotFound(format!("pipeline {}", pipeline_id))
            } else {
                e
            }
        })
    }

    /// Create a pipeline
    ///
    /// The service treats this POST as an upsert keyed by `pipeline.key`: a
    /// pipeline whose key already exists is replaced wholesale.
    pub async fn create_pipeline(&self, pipeline: &Pipeline) -> Result<Pipeline> {
        let response = self
            .request(Method::POST, PIPELINES_PATH, &[])?
            .json(pipeline)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create or replace a pipeline by key
    ///
    /// Resends the whole pipeline object; fields not present are not kept by
    /// the service, so always start from a freshly fetched pipeline.
    ///
    /// # Example
    /// ```no_run
    /// # use docflow_client::{ClientConfig, DocflowClient};
    /// # async fn example() -> docflow_client::Result<()> {
    /// let client = DocflowClient::new(ClientConfig::new("http://localhost:8080"))?;
    /// let mut pipeline = client.get_pipeline("p-1").await?;
    /// pipeline.active = Some(false);
    /// let stored = client.upsert_pipeline(&pipeline).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upsert_pipeline(&self, pipeline: &Pipeline) -> Result<Pipeline> {
        info!(
            "Upserting pipeline '{}' ({} tasks)",
            pipeline.key,
            pipeline.tasks.len()
        );
        self.create_pipeline(pipeline).await
    }

    /// Upsert a pipeline record exactly as given
    async fn upsert_pipeline_record(&self, record: &JsonMap) -> Result<Pipeline> {
        let response = self
            .request(Method::POST, PIPELINES_PATH, &[])?
            .json(record)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Update a pipeline by ID
    pub async fn update_pipeline(&self, pipeline_id: &str, pipeline: &Pipeline) -> Result<Pipeline> {
        let response = self
            .request(Method::PUT, PIPELINES_PATH, &[pipeline_id])?
            .json(pipeline)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a pipeline
    pub async fn delete_pipeline(&self, pipeline_id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, PIPELINES_PATH, &[pipeline_id])?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Replace one task of a stored pipeline
    ///
    /// Fetches the pipeline record, writes the task over the one sharing
    /// `task.id`, and resends the record through the upsert endpoint. Every
    /// other task and field goes back exactly as fetched, explicit nulls and
    /// integer-valued numbers included. Concurrent edits are last-write-wins.
    pub async fn replace_task(&self, pipeline_id: &str, task: Task) -> Result<Pipeline> {
        let mut record = self.get_pipeline_record(pipeline_id).await?;

        splice_task(&mut record, &task).map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        info!("Replacing task '{}' in pipeline {}", task.id, pipeline_id);
        self.upsert_pipeline_record(&record).await
    }

    /// Replace the whole task list of a stored pipeline
    ///
    /// Same fetch-then-resend contract as [`replace_task`](Self::replace_task),
    /// for editors that reorder, add or remove tasks. Tasks that did not change
    /// are resent as fetched.
    pub async fn replace_tasks(&self, pipeline_id: &str, tasks: Vec<Task>) -> Result<Pipeline> {
        let duplicates = duplicate_task_ids(&tasks);
        if !duplicates.is_empty() {
            return Err(ClientError::InvalidRequest(format!(
                "duplicate task ids: {}",
                duplicates.join(", ")
            )));
        }

        let mut record = self.get_pipeline_record(pipeline_id).await?;
        splice_tasks(&mut record, &tasks)
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        info!(
            "Replacing {} task(s) in pipeline {}",
            tasks.len(),
            pipeline_id
        );
        self.upsert_pipeline_record(&record).await
    }
}
