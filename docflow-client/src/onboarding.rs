//! Onboarding job endpoints

use std::time::Duration;

use crate::DocflowClient;
use crate::error::{ClientError, Result};
use docflow_core::domain::onboarding::OnboardProgress;
use docflow_core::dto::onboarding::{OnboardJob, OnboardRequest};
use reqwest::Method;
use tracing::{debug, info, warn};

const ONBOARD_PATH: &str = "/api/v1/onboard";

impl DocflowClient {
    /// Submit an onboarding request, starting a background job
    pub async fn save_onboarding(&self, req: &OnboardRequest) -> Result<OnboardJob> {
        let response = self
            .request(Method::POST, ONBOARD_PATH, &["save"])?
            .json(req)
            .send()
            .await?;

        let job: OnboardJob = self.handle_response(response).await?;
        info!("Onboarding job {} started for app {}", job.job_id, req.app_id);
        Ok(job)
    }

    /// Get the progress of an onboarding job
    pub async fn onboarding_progress(&self, job_id: &str) -> Result<OnboardProgress> {
        let response = self
            .request(Method::GET, ONBOARD_PATH, &["progress", job_id])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Cancel an onboarding job
    pub async fn cancel_onboarding(&self, job_id: &str) -> Result<()> {
        let response = self
            .request(Method::POST, ONBOARD_PATH, &["cancel", job_id])?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Poll an onboarding job until it reaches a terminal status
    ///
    /// Gives up with [`ClientError::Timeout`] once `deadline` has passed; the
    /// job itself keeps running on the service.
    pub async fn wait_for_onboarding(
        &self,
        job_id: &str,
        poll_interval: Duration,
        deadline: Duration,
    ) -> Result<OnboardProgress> {
        match tokio::time::timeout(deadline, self.poll_onboarding(job_id, poll_interval)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Onboarding job {} still running after {:?}",
                    job_id, deadline
                );
                Err(ClientError::Timeout(format!(
                    "onboarding job {} did not finish within {:?}",
                    job_id, deadline
                )))
            }
        }
    }

    async fn poll_onboarding(&self, job_id: &str, poll_interval: Duration) -> Result<OnboardProgress> {
        let mut interval = tokio::time::interval(poll_interval);

        loop {
            interval.tick().await;

            let progress = self.onboarding_progress(job_id).await?;
            debug!(
                "Onboarding job {}: {} ({}%)",
                job_id, progress.status, progress.progress
            );

            if progress.status.is_terminal() {
                return Ok(progress);
            }
        }
    }
}
