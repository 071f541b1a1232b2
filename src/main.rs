//! pkce-login - Main entry point
//!
//! Signs a user in against an OIDC identity provider using the OAuth 2.0
//! authorization code flow with PKCE and prints the access token.

use pkce_login::auth::{AuthFlow, PrintUrl, SystemBrowser, UrlPresenter};
use pkce_login::config::Config;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const BANNER: &str = r#"
╔══════════════════════════════════════════════════╗
║                    pkce-login                    ║
║   OAuth 2.0 authorization code + PKCE sign-in    ║
╚══════════════════════════════════════════════════╝
"#;

fn setup_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}", config.log_level())));

    // Logs go to stderr; stdout carries only the access token
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let config = Config::parse_args();

    setup_logging(&config);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if !config.silent {
        eprintln!("{}", BANNER);
        info!("Resource URL: {}", config.resource_url);
        info!("Tenant ID: {}", config.tenant_id);
        info!("Client ID: {}", config.client_id);
        info!("Scope: {}", config.scope());
        info!("Redirect URI: {}", config.redirect_uri());
        eprintln!();
    }

    let flow = AuthFlow::new(&config);
    let presenter: Box<dyn UrlPresenter> = if config.no_browser {
        Box::new(PrintUrl)
    } else {
        Box::new(SystemBrowser)
    };

    match flow.run(presenter.as_ref()).await {
        Ok(token) => {
            info!("Sign-in complete");
            println!("{}", token);
        }
        Err(e) => {
            error!("Sign-in failed: {}", e);
            std::process::exit(1);
        }
    }
}
