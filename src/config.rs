//! Configuration parsing and validation

use crate::error::{AuthError, Result};
use clap::Parser;

const DEFAULT_SCOPE: &str = "openid ocsapi";
const DEFAULT_CALLBACK_PORT: u16 = 5004;
const DEFAULT_CALLBACK_PATH: &str = "/callback.html";
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pkce-login",
    version,
    about = "OAuth 2.0 authorization code + PKCE sign-in",
    long_about = "Signs a user in against an OIDC identity provider using the authorization code flow with PKCE and prints the resulting access token"
)]
pub struct Config {
    /// Base URL of the resource to authenticate against
    #[arg(value_name = "RESOURCE_URL", env = "AUTH_RESOURCE_URL")]
    pub resource_url: String,

    /// Tenant identifier, sent as acr_values=tenant:<id>
    #[arg(long, env = "AUTH_TENANT_ID")]
    pub tenant_id: String,

    /// OAuth client ID of this application
    #[arg(long, env = "AUTH_CLIENT_ID")]
    pub client_id: String,

    /// Space-separated OAuth scopes (default: "openid ocsapi")
    #[arg(long, env = "AUTH_SCOPE")]
    pub scope: Option<String>,

    /// Local port the callback listener binds to (0 picks a free port)
    #[arg(long, env = "AUTH_CALLBACK_PORT", default_value_t = DEFAULT_CALLBACK_PORT)]
    pub callback_port: u16,

    /// Path component of the redirect URI
    #[arg(long, default_value = DEFAULT_CALLBACK_PATH)]
    pub callback_path: String,

    /// Seconds to wait for the authorization response before giving up
    #[arg(long, default_value_t = DEFAULT_CALLBACK_TIMEOUT_SECS)]
    pub callback_timeout_secs: u64,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Show only error messages
    #[arg(long, conflicts_with = "debug")]
    pub silent: bool,

    /// Enable debug logging
    #[arg(long, env = "AUTH_DEBUG")]
    pub debug: bool,
}

impl Config {
    /// Parse configuration from CLI arguments and environment variables
    pub fn parse_args() -> Self {
        Config::parse()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.resource_url.is_empty() {
            return Err(AuthError::Config("Resource URL is required".to_string()));
        }

        if self.tenant_id.is_empty() {
            return Err(AuthError::Config("Tenant ID is required".to_string()));
        }

        if self.client_id.is_empty() {
            return Err(AuthError::Config("Client ID is required".to_string()));
        }

        url::Url::parse(&self.resource_url)
            .map_err(|e| AuthError::Config(format!("Invalid resource URL: {}", e)))?;

        if !self.callback_path.starts_with('/') {
            return Err(AuthError::Config(
                "Callback path must start with '/'".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the requested scope (with default, "openid" always included)
    pub fn scope(&self) -> String {
        let scope = self.scope.as_deref().unwrap_or(DEFAULT_SCOPE);

        let mut scopes: Vec<&str> = scope.split_whitespace().collect();
        if !scopes.contains(&"openid") {
            scopes.insert(0, "openid");
        }

        scopes.join(" ")
    }

    /// Redirect URI as registered with the provider
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}{}", self.callback_port, self.callback_path)
    }

    /// Get log level based on flags
    pub fn log_level(&self) -> tracing::Level {
        if self.silent {
            tracing::Level::ERROR
        } else if self.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            resource_url: "https://cloud.example.com".to_string(),
            tenant_id: "t1".to_string(),
            client_id: "abc".to_string(),
            scope: None,
            callback_port: DEFAULT_CALLBACK_PORT,
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            callback_timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
            no_browser: false,
            silent: false,
            debug: false,
        }
    }

    #[test]
    fn test_scope_default() {
        let config = base_config();
        assert_eq!(config.scope(), "openid ocsapi");
    }

    #[test]
    fn test_scope_ensures_openid() {
        let mut config = base_config();
        config.scope = Some("ocsapi profile".to_string());

        let scope = config.scope();
        assert!(scope.starts_with("openid "));
        assert!(scope.contains("ocsapi"));
        assert!(scope.contains("profile"));
    }

    #[test]
    fn test_redirect_uri_default() {
        let config = base_config();
        assert_eq!(config.redirect_uri(), "http://localhost:5004/callback.html");
    }

    #[test]
    fn test_validate_rejects_bad_resource_url() {
        let mut config = base_config();
        config.resource_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_callback_path() {
        let mut config = base_config();
        config.callback_path = "callback.html".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }
}
