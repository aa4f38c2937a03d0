//! Docflow HTTP Client
//!
//! A type-safe HTTP client for the document-processing pipeline service.
//!
//! Every endpoint wraps its body in a `{success, message, data}` envelope.
//! The client unwraps it and turns both non-2xx statuses and `success: false`
//! bodies into a [`ClientError`].
//!
//! # Example
//!
//! ```no_run
//! use docflow_client::{ClientConfig, DocflowClient};
//! use docflow_core::dto::pipeline::PipelineFilters;
//!
//! #[tokio::main]
//! async fn main() -> docflow_client::Result<()> {
//!     let config = ClientConfig::new("http://localhost:8080").with_token("secret");
//!     let client = DocflowClient::new(config)?;
//!
//!     for pipeline in client.list_pipelines(&PipelineFilters::default()).await? {
//!         println!("{} ({} tasks)", pipeline.name, pipeline.tasks.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod llm_models;
mod onboarding;
mod pipelines;
mod profiles;
pub mod supersede;
pub mod transcription;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, Result};

use docflow_core::dto::envelope::ApiEnvelope;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// HTTP client for the Docflow REST APIs
///
/// This client provides methods for all service endpoints, organized
/// into logical groups:
/// - Pipeline management (list, get, create/upsert, update, delete, task replacement)
/// - LLM model registry (CRUD and search, validated before sending)
/// - User profiles (list, save, my profile, search)
/// - Onboarding jobs (save, progress, cancel)
#[derive(Debug, Clone)]
pub struct DocflowClient {
    config: ClientConfig,
    /// HTTP client instance
    client: Client,
}

impl DocflowClient {
    /// Create a new client
    ///
    /// The underlying HTTP client is built with the configured timeout.
    ///
    /// # Example
    /// ```
    /// use docflow_client::{ClientConfig, DocflowClient};
    ///
    /// let client = DocflowClient::new(ClientConfig::new("http://localhost:8080")).unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:8080");
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. The configured
    /// timeout is still applied to every request.
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL of `path` (relative to the base URL) followed by `segments`
    ///
    /// Each segment is percent-encoded, so ids containing `/`, `?` or `#` stay
    /// a single path segment.
    fn url(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, path))
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid URL for {}: {}", path, e)))?;

        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| {
                    ClientError::InvalidRequest(format!("{} cannot take path segments", path))
                })?
                .pop_if_empty()
                .extend(segments);
        }

        Ok(url)
    }

    /// Start a request to `path` plus any id `segments`
    ///
    /// Always sends JSON content headers, and the bearer token when configured.
    fn request(&self, method: Method, path: &str, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(path, segments)?;
        debug!("{} {}", method, url);

        let builder = self
            .client
            .request(method, url)
            .timeout(self.config.timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        Ok(match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize the envelope's `data`
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let envelope = self.read_envelope(response).await?;

        let data = envelope
            .data
            .filter(|d| !d.is_null())
            .ok_or_else(|| ClientError::ParseError("Response envelope has no data".to_string()))?;

        serde_json::from_value(data)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse response data: {}", e)))
    }

    /// Handle an API response whose `data` is not needed (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.read_envelope(response).await.map(|_| ())
    }

    /// Check status and envelope, returning the envelope on success
    async fn read_envelope(&self, response: reqwest::Response) -> Result<ApiEnvelope<Value>> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
            warn!("Request failed with status {}: {}", status, message);
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        // Some DELETE endpoints answer 204 with no body
        if body.trim().is_empty() {
            return Ok(ApiEnvelope {
                success: true,
                message: None,
                data: None,
            });
        }

        let envelope: ApiEnvelope<Value> = serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))?;

        if !envelope.success {
            let message = envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Request was not successful".to_string());
            warn!("Request rejected: {}", message);
            return Err(ClientError::Rejected(message));
        }

        Ok(envelope)
    }
}

/// Best message for an error body: the envelope's `message`, else the raw text
fn error_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    let from_envelope = serde_json::from_str::<ApiEnvelope<Value>>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty());
    Some(from_envelope.unwrap_or_else(|| body.trim().to_string()))
}
