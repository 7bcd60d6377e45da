//! HTTP request handlers.

pub(crate) mod pages;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use quill_storage::Title;

use crate::error::ServerError;
use crate::templates::title_path;

/// Validate a title taken from the request path.
pub(crate) fn parse_title(raw: String) -> Result<Title, ServerError> {
    Ok(Title::new(raw)?)
}

/// 302 Found redirect to `location`.
///
/// axum's `Redirect` only builds 303, 307 and 308 responses.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// Redirect to `{prefix}/{title}`.
pub(crate) fn found_title(prefix: &str, title: &Title) -> Response {
    found(&title_path(prefix, title))
}
