//! Authorization callback capture
//!
//! Temporary HTTP listener that receives the provider redirect on localhost
//! and hands the authorization code back to the waiting flow. The listener
//! captures exactly one response per run: the code travels over a one-shot
//! channel, so a second request can never overwrite a captured code.

use crate::error::{AuthError, Result};
use axum::{
    extract::Query,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

/// How long to wait for the in-flight confirmation page to flush before the
/// listener is torn down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const SUCCESS_PAGE: &str = "<h1>You can now return to the application.</h1>";

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Outcome of a captured authorization redirect.
#[derive(Debug)]
pub struct CallbackResult {
    pub code: String,
}

type CodeSender = Arc<Mutex<Option<oneshot::Sender<Result<CallbackResult>>>>>;

/// Single-shot listener for the authorization redirect.
pub struct CallbackServer {
    listener: tokio::net::TcpListener,
    path: String,
}

impl CallbackServer {
    /// Bind the listener on localhost
    ///
    /// Binding happens before the authorization URL is handed to the user, so
    /// the provider cannot redirect into a closed port.
    pub async fn bind(port: u16, path: &str) -> Result<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::Bind(format!("127.0.0.1:{}: {}", port, e)))?;

        tracing::info!(
            "Callback listener on http://{}{}",
            listener.local_addr()?,
            path
        );

        Ok(Self {
            listener,
            path: path.to_string(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the first redirect arrives and return its authorization code
    ///
    /// The bound port is released on every exit path, including timeout. The
    /// in-flight confirmation page is allowed to finish before the listener
    /// shuts down.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<CallbackResult> {
        let (tx, rx) = oneshot::channel::<Result<CallbackResult>>();
        let tx: CodeSender = Arc::new(Mutex::new(Some(tx)));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new().route(
            &self.path,
            get({
                let tx = tx.clone();
                move |Query(params): Query<CallbackQuery>| async move {
                    handle_callback(params, tx).await
                }
            }),
        );

        let server = axum::serve(self.listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let mut server_task = tokio::spawn(async move { server.await });

        let outcome = tokio::select! {
            result = rx => {
                match result {
                    Ok(captured) => captured,
                    Err(_) => Err(AuthError::Callback("Callback channel closed".to_string())),
                }
            }
            _ = tokio::time::sleep(timeout) => {
                Err(AuthError::Timeout(format!(
                    "No authorization response within {} seconds",
                    timeout.as_secs()
                )))
            }
        };

        let _ = shutdown_tx.send(());
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut server_task).await {
            Ok(Ok(Err(e))) => tracing::warn!("Callback listener error: {}", e),
            Ok(Err(e)) => tracing::warn!("Callback listener task failed: {}", e),
            Ok(Ok(Ok(()))) => {}
            Err(_) => {
                tracing::warn!("Callback listener did not shut down in time, aborting");
                server_task.abort();
            }
        }

        outcome
    }
}

async fn handle_callback(params: CallbackQuery, tx: CodeSender) -> impl IntoResponse {
    if let Some(error) = params.error {
        let description = params
            .error_description
            .unwrap_or_else(|| "no description provided".to_string());
        let message = format!("Provider returned {}: {}", error, description);

        deliver(&tx, Err(AuthError::Callback(message.clone()))).await;

        return Html(format!("<h1>Sign-in failed.</h1><p>{}</p>", message));
    }

    match params.code {
        Some(code) => {
            deliver(&tx, Ok(CallbackResult { code })).await;
            Html(SUCCESS_PAGE.to_string())
        }
        None => {
            deliver(
                &tx,
                Err(AuthError::Callback(
                    "Redirect query string did not include a code parameter".to_string(),
                )),
            )
            .await;
            Html(
                "<h1>Sign-in failed.</h1><p>The authorization response did not include a code.</p>"
                    .to_string(),
            )
        }
    }
}

async fn deliver(tx: &CodeSender, result: Result<CallbackResult>) {
    if let Some(sender) = tx.lock().await.take() {
        let _ = sender.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_code_from_first_request() {
        let server = CallbackServer::bind(0, "/callback.html").await.unwrap();
        let addr = server.local_addr().unwrap();
        let wait = tokio::spawn(server.wait_for_code(Duration::from_secs(5)));

        let response = reqwest::get(format!("http://{}/callback.html?code=XYZ", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = response.text().await.unwrap();
        assert!(body.contains("You can now return to the application."));

        let result = wait.await.unwrap().unwrap();
        assert_eq!(result.code, "XYZ");
    }

    #[tokio::test]
    async fn test_missing_code_is_an_error_and_releases_the_port() {
        let server = CallbackServer::bind(0, "/callback.html").await.unwrap();
        let addr = server.local_addr().unwrap();
        let wait = tokio::spawn(server.wait_for_code(Duration::from_secs(5)));

        let response = reqwest::get(format!("http://{}/callback.html?state=abc", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let err = wait.await.unwrap().unwrap_err();
        assert!(matches!(err, AuthError::Callback(_)));

        // The listener must be gone; the port binds again
        CallbackServer::bind(addr.port(), "/callback.html")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_provider_error_redirect_is_surfaced() {
        let server = CallbackServer::bind(0, "/callback.html").await.unwrap();
        let addr = server.local_addr().unwrap();
        let wait = tokio::spawn(server.wait_for_code(Duration::from_secs(5)));

        reqwest::get(format!(
            "http://{}/callback.html?error=access_denied&error_description=user+cancelled",
            addr
        ))
        .await
        .unwrap();

        let err = wait.await.unwrap().unwrap_err();
        match err {
            AuthError::Callback(message) => assert!(message.contains("access_denied")),
            other => panic!("expected Callback error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bind_fails_when_port_is_taken() {
        let first = CallbackServer::bind(0, "/callback.html").await.unwrap();
        let port = first.local_addr().unwrap().port();

        let second = CallbackServer::bind(port, "/callback.html").await;
        assert!(matches!(second, Err(AuthError::Bind(_))));
    }

    #[tokio::test]
    async fn test_times_out_without_a_request() {
        let server = CallbackServer::bind(0, "/callback.html").await.unwrap();
        let port = server.local_addr().unwrap().port();

        let err = server
            .wait_for_code(Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Timeout(_)));

        // Timeout must release the port as well
        CallbackServer::bind(port, "/callback.html").await.unwrap();
    }

    #[tokio::test]
    async fn test_second_request_does_not_overwrite_captured_code() {
        let (tx, rx) = oneshot::channel();
        let tx: CodeSender = Arc::new(Mutex::new(Some(tx)));

        let _ = handle_callback(
            CallbackQuery {
                code: Some("first".to_string()),
                error: None,
                error_description: None,
            },
            tx.clone(),
        )
        .await;
        let _ = handle_callback(
            CallbackQuery {
                code: Some("second".to_string()),
                error: None,
                error_description: None,
            },
            tx.clone(),
        )
        .await;

        let captured = rx.await.unwrap().unwrap();
        assert_eq!(captured.code, "first");
    }
}
