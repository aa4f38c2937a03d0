//! User profile endpoints

use crate::DocflowClient;
use crate::error::Result;
use docflow_core::domain::profile::{ResolvedProfile, UserProfile};
use docflow_core::dto::profile::ProfileSearch;
use reqwest::Method;

const PROFILES_PATH: &str = "/api/v1/profiles";

impl DocflowClient {
    /// List all profiles
    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        let response = self
            .request(Method::GET, PROFILES_PATH, &[])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create or update a profile
    pub async fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        let response = self
            .request(Method::POST, PROFILES_PATH, &[])?
            .json(profile)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Profile of the authenticated caller, with resolved roles and permissions
    pub async fn my_profile(&self) -> Result<ResolvedProfile> {
        let response = self
            .request(Method::GET, PROFILES_PATH, &["myprofile"])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Search profiles by free text
    pub async fn search_profiles(&self, query: &str) -> Result<Vec<UserProfile>> {
        let response = self
            .request(Method::POST, PROFILES_PATH, &["search"])?
            .json(&ProfileSearch {
                query: query.to_string(),
            })
            .send()
            .await?;

        self.handle_response(response).await
    }
}
