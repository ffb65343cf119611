use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::error::PipelineError;
use crate::state::AppState;

/// Prefix of the plain-text body returned when report generation fails.
pub const PROCESSING_ERROR_PREFIX: &str = "Error processing file: ";

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    match state.views.index() {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_failure(e),
    }
}

// ---------------------------------------------------------------------------
// POST /upload
// ---------------------------------------------------------------------------

/// Store the `file` part and redirect to its report. Any validation failure
/// silently redirects back to the page the form was posted from.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let back = referrer(&headers);

    let Ok(mut multipart) = multipart else {
        log::warn!("Upload rejected: request is not multipart/form-data");
        return Redirect::to(&back).into_response();
    };

    let mut filename = None;
    let mut bytes = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (e.status(), e.body_text()).into_response(),
        };
        // A part without a filename is a plain form value, not a file.
        if field.name() != Some("file") || field.file_name().is_none() {
            continue;
        }
        filename = field.file_name().map(str::to_string);
        match field.bytes().await {
            Ok(data) => bytes = data.to_vec(),
            Err(e) => return (e.status(), e.body_text()).into_response(),
        }
        break;
    }

    let pipeline = state.pipeline.clone();
    let stored =
        tokio::task::spawn_blocking(move || pipeline.accept_upload(filename.as_deref(), &bytes)).await;

    match stored {
        Ok(Ok(key)) => Redirect::to(&format!("/run_model/{key}")).into_response(),
        Ok(Err(PipelineError::Validation(reason))) => {
            log::warn!("Upload rejected: {reason}");
            Redirect::to(&back).into_response()
        }
        Ok(Err(e)) => {
            log::error!("Upload failed ({}): {e}", e.kind());
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error saving file: {e}")).into_response()
        }
        Err(e) => join_failure(e),
    }
}

/// The page the request came from, or the upload form when unknown.
fn referrer(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/")
        .to_string()
}

// ---------------------------------------------------------------------------
// GET /run_model/:filename
// ---------------------------------------------------------------------------

pub async fn run_model(State(state): State<Arc<AppState>>, Path(filename): Path<String>) -> Response {
    let pipeline = state.pipeline.clone();
    let key = filename.clone();
    let report = match tokio::task::spawn_blocking(move || pipeline.generate_report(&key)).await {
        Ok(report) => report,
        Err(e) => return join_failure(e),
    };

    match report {
        Ok(report) => match state.views.results(&filename, &report) {
            Ok(html) => Html(html).into_response(),
            Err(e) => render_failure(e),
        },
        Err(e) => {
            log::warn!("Report for '{filename}' failed ({}): {e}", e.kind());
            format!("{PROCESSING_ERROR_PREFIX}{e}").into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn render_failure(e: minijinja::Error) -> Response {
    log::error!("Template rendering failed: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Template rendering failed").into_response()
}

fn join_failure(e: tokio::task::JoinError) -> Response {
    log::error!("Worker task failed: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
