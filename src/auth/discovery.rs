//! Provider endpoint discovery
//!
//! Fetches the provider metadata document and extracts the authorization and
//! token endpoints.

use serde::Deserialize;

use crate::error::{AuthError, Result};

const DISCOVERY_PATH: &str = "/identity/.well-known/openid-configuration";

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

impl ProviderEndpoints {
    /// Discover the provider endpoints from the resource base URL
    pub async fn discover(resource_url: &str) -> Result<Self> {
        let discovery_url = format!("{}{}", resource_url.trim_end_matches('/'), DISCOVERY_PATH);

        let client = reqwest::Client::new();
        let response = client
            .get(&discovery_url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| {
                AuthError::Discovery(format!("Failed to fetch provider configuration: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AuthError::Discovery(format!(
                "Discovery request failed with status: {}",
                response.status()
            )));
        }

        let endpoints: ProviderEndpoints = response.json().await.map_err(|e| {
            AuthError::Discovery(format!("Failed to parse provider configuration: {}", e))
        })?;

        if endpoints.authorization_endpoint.is_empty() {
            return Err(AuthError::Discovery(
                "Provider configuration missing authorization_endpoint".to_string(),
            ));
        }

        if endpoints.token_endpoint.is_empty() {
            return Err(AuthError::Discovery(
                "Provider configuration missing token_endpoint".to_string(),
            ));
        }

        Ok(endpoints)
    }
}
