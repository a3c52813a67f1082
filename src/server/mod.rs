//! HTTP front end.

use std::net::SocketAddr;

use axum::{Router, routing::post};
use tokio::net::TcpListener;

use crate::{prelude::*, recognizer::Recognizer};

pub mod api;
pub mod recognize;

/// State shared by all requests.
#[derive(Clone)]
pub struct AppState {
    /// Our one and only engine handle.
    pub recognizer: Recognizer,
}

impl AppState {
    /// Create state around an already-initialized recognizer.
    pub fn new(recognizer: Recognizer) -> Self {
        Self { recognizer }
    }
}

/// Build our router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ocr", post(recognize::recognize))
        .with_state(state)
}

/// Listen on `addr` and serve requests until interrupted with Ctrl-C.
#[instrument(level = "debug", skip(state))]
pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot listen on {}", addr))?;
    info!(
        "OCR server listening on http://{}",
        listener.local_addr().context("cannot get local address")?
    );
    serve(listener, state, shutdown_signal()).await
}

/// Serve requests on `listener` until `shutdown` completes. Requests already
/// in flight are allowed to finish.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Wait for Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(err) => {
            // Without a signal handler, we just run until killed.
            error!(error = %err, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
