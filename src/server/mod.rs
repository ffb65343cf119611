/// HTTP layer: axum router, request handlers, and HTML views.
///
/// ```text
///  GET  /                     → index.html (upload form)
///  POST /upload               → store file → 303 /run_model/<key>
///                               (validation failure → 303 back to referrer)
///  GET  /run_model/<key>      → results.html | "Error processing file: …"
/// ```

pub mod routes;
pub mod views;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Build the application router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(routes::index))
        .route("/upload", post(routes::upload).layer(upload_limit))
        .route("/run_model/:filename", get(routes::run_model))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl+C.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr = state.config.bind_addr();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    log::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
}
