//! Authorization code token exchange
//!
//! Posts the captured code and the PKCE verifier to the token endpoint and
//! extracts the access token from the response.

use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, Result};

/// Token response from the provider. Fields beyond `access_token` are kept
/// for logging only.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Exchange an authorization code for an access token
///
/// Sends a single form-encoded POST; a rejected or malformed exchange is a
/// terminal failure, never retried.
pub async fn exchange_code(
    token_endpoint: &str,
    client_id: &str,
    verifier: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<String> {
    let params = [
        ("grant_type", "authorization_code"),
        ("client_id", client_id),
        ("code_verifier", verifier),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];

    let client = reqwest::Client::new();
    let response = client
        .post(token_endpoint)
        .form(&params)
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::TokenExchange(format!(
            "Provider rejected the exchange with status {}: {}",
            status, body
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AuthError::TokenExchange(format!("Failed to read response: {}", e)))?;

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| AuthError::TokenExchange(format!("Failed to parse token response: {}", e)))?;

    if token.access_token.is_empty() {
        return Err(AuthError::TokenExchange(
            "Response did not include an access token".to_string(),
        ));
    }

    debug!(
        "Received {} token{}",
        token.token_type.as_deref().unwrap_or("access"),
        token
            .expires_in
            .map(|s| format!(", expires in {} seconds", s))
            .unwrap_or_default()
    );

    Ok(token.access_token)
}
