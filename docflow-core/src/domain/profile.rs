//! User profile domain model

use serde::{Deserialize, Serialize};

use super::task::JsonMap;

/// A user profile as stored by the profile service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub app_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A profile together with the roles and permissions the service resolved for it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProfile {
    pub profile: UserProfile,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl ResolvedProfile {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Permission check; a trailing `*` segment grants every permission under it
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| {
            granted == permission
                || granted
                    .strip_suffix('*')
                    .is_some_and(|prefix| permission.starts_with(prefix))
        })
    }
}
