//! Pipeline DTOs

use serde::{Deserialize, Serialize};

/// Filters accepted by `GET /api/v1/pipelines`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFilters {
    pub app_id: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl PipelineFilters {
    /// Query parameters for the list request; empty filters produce none
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(app_id) = self.app_id.as_deref().filter(|a| !a.is_empty()) {
            query.push(("app_id", app_id.to_string()));
        }
        if !self.labels.is_empty() {
            query.push(("labels", self.labels.join(",")));
        }
        query
    }
}
