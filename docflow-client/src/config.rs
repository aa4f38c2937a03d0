//! Client configuration
//!
//! Connection settings and credentials are passed explicitly to the client
//! rather than looked up on every request.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the service (e.g., "https://docflow.example.org")
    pub base_url: String,

    /// Bearer token attached to every request when present
    pub token: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a new configuration with defaults and no credentials
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Attach a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - DOCFLOW_API_URL (required)
    /// - DOCFLOW_TOKEN (optional)
    /// - DOCFLOW_TIMEOUT_SECS (optional, default: 30)
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("DOCFLOW_API_URL").map_err(|_| {
            ClientError::InvalidRequest("DOCFLOW_API_URL environment variable not set".to_string())
        })?;

        let mut config = Self::new(base_url);

        if let Ok(token) = std::env::var("DOCFLOW_TOKEN") {
            config = config.with_token(token);
        }

        if let Some(timeout) = std::env::var("DOCFLOW_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(timeout);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::InvalidRequest(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::InvalidRequest(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(ClientError::InvalidRequest(
                "timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
