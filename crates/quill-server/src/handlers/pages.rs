//! Page endpoints: list, view, edit and save.
//!
//! Store calls do blocking file I/O and are moved to the blocking pool.

use std::sync::Arc;

use axum::Form;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use quill_pages::PageError;
use serde::Deserialize;

use crate::error::ServerError;
use crate::handlers::{found, found_title, parse_title};
use crate::state::AppState;
use crate::templates;

/// Form body for POST /save/{title}.
#[derive(Debug, Deserialize)]
pub(crate) struct SaveForm {
    #[serde(default)]
    content: String,
}

/// Handle GET /.
pub(crate) async fn index() -> Response {
    found("/list")
}

/// Handle GET /list.
pub(crate) async fn list(State(state): State<Arc<AppState>>) -> Result<Response, ServerError> {
    let pages = Arc::clone(&state.pages);
    let mut titles = tokio::task::spawn_blocking(move || {
        pages.list().map(|page| page.title).collect::<Vec<_>>()
    })
    .await?;
    titles.sort();

    Ok(Html(templates::render_list(&titles)).into_response())
}

/// Handle GET /view/{title}.
///
/// Pages without rendered output, or whose output cannot be read, redirect
/// to the editor.
pub(crate) async fn view(
    Path(raw): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ServerError> {
    let title = parse_title(raw)?;
    let pages = Arc::clone(&state.pages);
    let lookup = title.clone();
    let result = tokio::task::spawn_blocking(move || pages.get(&lookup)).await?;

    match result {
        Ok(page) => {
            let body = page.rendered_html().unwrap_or_default();
            Ok(Html(templates::render_view(&title, &body)).into_response())
        }
        Err(PageError::NotFound { .. }) => {
            tracing::info!(title = %title, "Page does not exist, redirecting to editor");
            Ok(found_title("/edit", &title))
        }
        Err(e) => {
            tracing::warn!(title = %title, error = %e, "Failed to read page, redirecting to editor");
            Ok(found_title("/edit", &title))
        }
    }
}

/// Handle GET /edit/{title}.
pub(crate) async fn edit(
    Path(raw): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ServerError> {
    let title = parse_title(raw)?;
    let pages = Arc::clone(&state.pages);
    let lookup = title.clone();
    let result = tokio::task::spawn_blocking(move || pages.get_source(&lookup)).await?;

    let source = match result {
        Ok(page) => page.source_text().unwrap_or_default().into_owned(),
        Err(PageError::NotFound { .. }) => String::new(),
        Err(e) => {
            tracing::warn!(title = %title, error = %e, "Failed to read page source");
            String::new()
        }
    };

    Ok(Html(templates::render_edit(&title, &source)).into_response())
}

/// Handle POST /save/{title}.
///
/// Always redirects to the view page; a failed save leaves the previous
/// version in place and is only logged.
pub(crate) async fn save(
    Path(raw): Path<String>,
    State(state): State<Arc<AppState>>,
    Form(form): Form<SaveForm>,
) -> Result<Response, ServerError> {
    let title = parse_title(raw)?;
    let pages = Arc::clone(&state.pages);
    let target = title.clone();
    let result =
        tokio::task::spawn_blocking(move || pages.save(&target, form.content.as_bytes())).await?;

    if let Err(e) = result {
        tracing::error!(title = %title, error = %e, "Failed to save page");
    }

    Ok(found_title("/view", &title))
}
