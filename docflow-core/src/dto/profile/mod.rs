//! Profile DTOs

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/profiles/search`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSearch {
    pub query: String,
}
