//! Static file serving from the public directory.

use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Body of every static-file miss.
const NOT_FOUND_BODY: &str = "404";

/// Handle GET /public/{*path}.
pub(crate) async fn serve_public(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(file) = resolve(&state.public_dir, &path) else {
        tracing::warn!(path = %path, "Rejected static file path");
        return not_found();
    };

    match tokio::fs::read(&file).await {
        Ok(content) => match content_type(&file) {
            Some(mime) => ([(header::CONTENT_TYPE, mime)], content).into_response(),
            None => untyped(content),
        },
        Err(e) => {
            tracing::debug!(path = %file.display(), error = %e, "Static file not found");
            not_found()
        }
    }
}

/// Join `requested` onto `dir`, refusing anything that could leave it.
fn resolve(dir: &FsPath, requested: &str) -> Option<PathBuf> {
    let requested = FsPath::new(requested);
    let mut components = requested.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(dir.join(requested))
    } else {
        None
    }
}

/// Content type for a static file; `None` when the extension is unknown.
fn content_type(path: &FsPath) -> Option<String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("css") => Some("text/css".to_owned()),
        Some("js") => Some("text/javascript".to_owned()),
        _ => mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_owned()),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

/// Bytes response with no `Content-Type` header.
fn untyped(content: Vec<u8>) -> Response {
    let mut response = content.into_response();
    response.headers_mut().remove(header::CONTENT_TYPE);
    response
}
