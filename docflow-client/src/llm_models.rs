//! LLM model registry endpoints

use crate::DocflowClient;
use crate::error::Result;
use docflow_core::domain::llm_model::LlmModel;
use docflow_core::dto::llm_model::ModelSearch;
use docflow_core::validation::validate_llm_model;
use reqwest::Method;

const LLM_MODELS_PATH: &str = "/api/v1/llm-models";

impl DocflowClient {
    /// List all registered models
    pub async fn list_llm_models(&self) -> Result<Vec<LlmModel>> {
        let response = self
            .request(Method::GET, LLM_MODELS_PATH, &[])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a model by ID
    pub async fn get_llm_model(&self, model_id: &str) -> Result<LlmModel> {
        let response = self
            .request(Method::GET, LLM_MODELS_PATH, &[model_id])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Register a model
    ///
    /// The record is validated first; an invalid record is never sent.
    pub async fn create_llm_model(&self, model: &LlmModel) -> Result<LlmModel> {
        validate_llm_model(model)?;

        let response = self
            .request(Method::POST, LLM_MODELS_PATH, &[])?
            .json(model)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Update a model
    ///
    /// The record is validated first; an invalid record is never sent.
    pub async fn update_llm_model(&self, model_id: &str, model: &LlmModel) -> Result<LlmModel> {
        validate_llm_model(model)?;

        let response = self
            .request(Method::PUT, LLM_MODELS_PATH, &[model_id])?
            .json(model)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a model
    pub async fn delete_llm_model(&self, model_id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, LLM_MODELS_PATH, &[model_id])?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Search models
    pub async fn search_llm_models(&self, search: &ModelSearch) -> Result<Vec<LlmModel>> {
        let response = self
            .request(Method::POST, LLM_MODELS_PATH, &["search"])?
            .json(search)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
