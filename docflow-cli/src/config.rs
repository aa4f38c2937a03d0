//! Configuration module
//!
//! Handles CLI configuration: service URL, credentials and timeout.

use std::time::Duration;

use anyhow::{Context, Result};
use docflow_client::{ClientConfig, DocflowClient};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the pipeline service
    pub api_url: String,
    /// Bearer token, if any
    pub token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    /// Client settings derived from the command line
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.api_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }

    /// Build a client for this configuration
    pub fn client(&self) -> Result<DocflowClient> {
        DocflowClient::new(self.client_config())
            .with_context(|| format!("Invalid service configuration for {}", self.api_url))
    }
}
