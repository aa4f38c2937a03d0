//! Onboarding DTOs

use serde::{Deserialize, Serialize};

use crate::domain::task::JsonMap;

/// Body of `POST /api/v1/onboard/save`
///
/// Only the application identity is interpreted; the rest of the onboarding
/// form is forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnboardRequest {
    pub app_id: String,
    pub app_name: String,
    #[serde(flatten)]
    pub settings: JsonMap,
}

/// Handle returned when an onboarding job is started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardJob {
    pub job_id: String,
}
