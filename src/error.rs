//! Error types for the PKCE login flow

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Endpoint discovery failed: {0}")]
    Discovery(String),

    #[error("Failed to bind callback listener: {0}")]
    Bind(String),

    #[error("Authorization callback error: {0}")]
    Callback(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("System random source failed: {0}")]
    RandomSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
