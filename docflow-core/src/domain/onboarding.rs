//! Onboarding job domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an onboarding job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl OnboardStatus {
    /// Whether the job has stopped and its progress will not change
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OnboardStatus::Completed | OnboardStatus::Failed | OnboardStatus::Cancelled
        )
    }
}

impl fmt::Display for OnboardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnboardStatus::Pending => write!(f, "Pending"),
            OnboardStatus::Running => write!(f, "Running"),
            OnboardStatus::Completed => write!(f, "Completed"),
            OnboardStatus::Failed => write!(f, "Failed"),
            OnboardStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Progress report for an onboarding job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardProgress {
    pub job_id: String,
    pub status: OnboardStatus,
    /// Percent complete, 0-100
    #[serde(default)]
    pub progress: u8,
    pub message: Option<String>,
}
