//! Authorization code + PKCE flow orchestration
//!
//! Sequences one sign-in attempt: generate the PKCE pair, discover the
//! provider endpoints, bind the callback listener, present the authorization
//! URL, wait for the redirect, exchange the code for an access token. The
//! verifier, challenge and code never outlive one run.

use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::callback::CallbackServer;
use super::discovery::ProviderEndpoints;
use super::pkce::PkcePair;
use super::token;
use crate::config::Config;
use crate::error::Result;

/// Presents the authorization URL to the resource owner.
///
/// The default implementation opens the system browser; tests substitute a
/// driver that fetches the redirect URI programmatically.
pub trait UrlPresenter {
    fn present(&self, url: &str) -> Result<()>;
}

/// Opens the authorization URL in the system web browser, falling back to
/// printing it when no browser can be launched.
pub struct SystemBrowser;

impl UrlPresenter for SystemBrowser {
    fn present(&self, url: &str) -> Result<()> {
        if let Err(e) = webbrowser::open(url) {
            warn!("Failed to open browser: {}", e);
            eprintln!("\nCould not open a browser automatically.");
            eprintln!("Please open this URL in your browser:\n\n{}\n", url);
        }
        Ok(())
    }
}

/// Prints the authorization URL instead of opening a browser.
pub struct PrintUrl;

impl UrlPresenter for PrintUrl {
    fn present(&self, url: &str) -> Result<()> {
        eprintln!("\nOpen this URL in your browser to sign in:\n\n{}\n", url);
        Ok(())
    }
}

/// One sign-in attempt against the configured provider.
pub struct AuthFlow {
    resource_url: String,
    tenant_id: String,
    client_id: String,
    scope: String,
    callback_port: u16,
    callback_path: String,
    callback_timeout: Duration,
}

impl AuthFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            resource_url: config.resource_url.clone(),
            tenant_id: config.tenant_id.clone(),
            client_id: config.client_id.clone(),
            scope: config.scope(),
            callback_port: config.callback_port,
            callback_path: config.callback_path.clone(),
            callback_timeout: Duration::from_secs(config.callback_timeout_secs),
        }
    }

    /// Run one complete authorization attempt and return the access token
    ///
    /// Steps are strictly ordered; any failure aborts the rest and surfaces
    /// the originating error. The callback listener is bound before the URL
    /// is presented and released on every exit path.
    pub async fn run(&self, presenter: &dyn UrlPresenter) -> Result<String> {
        let pkce = PkcePair::generate()?;

        info!("Resolving authorization and token endpoints");
        let endpoints = ProviderEndpoints::discover(&self.resource_url).await?;
        debug!("authorization_endpoint: {}", endpoints.authorization_endpoint);
        debug!("token_endpoint: {}", endpoints.token_endpoint);

        info!("Starting local listener for the authorization response");
        let server = CallbackServer::bind(self.callback_port, &self.callback_path).await?;

        // Derived from the bound address so a port-0 configuration still
        // produces a redirect the listener will actually receive.
        let redirect_uri = format!(
            "http://localhost:{}{}",
            server.local_addr()?.port(),
            self.callback_path
        );

        let auth_url = build_authorization_url(
            &endpoints.authorization_endpoint,
            &pkce.challenge,
            &self.client_id,
            &redirect_uri,
            &self.scope,
            &self.tenant_id,
        )?;

        info!("Waiting for the user to authorize");
        presenter.present(&auth_url)?;

        let callback = server.wait_for_code(self.callback_timeout).await?;
        debug!("Authorization code received");

        info!("Exchanging the authorization code for an access token");
        token::exchange_code(
            &endpoints.token_endpoint,
            &self.client_id,
            &pkce.verifier,
            &callback.code,
            &redirect_uri,
        )
        .await
    }
}

/// Assemble the authorization request URL
///
/// The parameter set and ordering are fixed. Values are expected to be
/// URL-safe: the challenge is base64url by construction, the rest come from
/// configuration. The endpoint is validated to parse before assembly.
pub fn build_authorization_url(
    auth_endpoint: &str,
    challenge: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    tenant_id: &str,
) -> Result<String> {
    Url::parse(auth_endpoint)?;

    Ok(format!(
        "{}?response_type=code&code_challenge={}&code_challenge_method=S256&client_id={}&redirect_uri={}&scope={}&acr_values=tenant:{}",
        auth_endpoint, challenge, client_id, redirect_uri, scope, tenant_id
    ))
}
