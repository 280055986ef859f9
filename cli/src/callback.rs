//! Local listener that completes the authorization-code handshake.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
};
use tracing::{info, warn};

use crate::error::CallbackError;

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
}

/// HTTP reply for a callback request, plus the handshake result if it ends the wait.
fn resolve(
    params: CallbackParams,
    expected_state: &str,
) -> (StatusCode, String, Option<Result<String, CallbackError>>) {
    if let Some(error) = params.error {
        return (
            StatusCode::UNAUTHORIZED,
            format!("Authorization failed: {error}"),
            Some(Err(CallbackError::Denied(error))),
        );
    }
    if params.state.as_deref() != Some(expected_state) {
        return (
            StatusCode::BAD_REQUEST,
            "State mismatch, please restart the authorization".to_string(),
            None,
        );
    }
    match params.code.filter(|c| !c.trim().is_empty()) {
        Some(code) => (
            StatusCode::OK,
            "Authorization complete, you can close this window.".to_string(),
            Some(Ok(code)),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Got invalid code".to_string(),
            None,
        ),
    }
}

struct CallbackState {
    expected_state: String,
    results: mpsc::Sender<Result<String, CallbackError>>,
}

async fn callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, String) {
    let (status, body, result) = resolve(params, &state.expected_state);
    match result {
        Some(result) => {
            info!("Got authorization response from callback");
            // only the first completed handshake is used
            let _ = state.results.try_send(result);
        }
        None => warn!("Ignoring callback: {}", body),
    }
    (status, body)
}

fn router(expected_state: String, results: mpsc::Sender<Result<String, CallbackError>>) -> Router {
    Router::new()
        .route("/callback", get(callback))
        .with_state(Arc::new(CallbackState {
            expected_state,
            results,
        }))
}

/// Serves `GET /callback` on `port` until a code (or a denial) arrives, then shuts down.
pub async fn wait_for_code(port: u16, expected_state: String) -> Result<String, CallbackError> {
    let (results_tx, mut results_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Waiting for authorization callback on port {}", port);

    let app = router(expected_state, results_tx);
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let result = results_rx.recv().await.unwrap_or(Err(CallbackError::Closed));
    let _ = shutdown_tx.send(());
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Callback listener error: {}", e),
        Err(e) => warn!("Callback listener task failed: {}", e),
    }
    result
}
