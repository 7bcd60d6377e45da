//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quill_storage::TitleError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Requested title is not a valid page title.
    #[error("Invalid page title: {0}")]
    InvalidTitle(#[from] TitleError),

    /// Blocking store task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidTitle(_) => StatusCode::BAD_REQUEST,
            Self::Task(e) => {
                tracing::error!(error = %e, "Request task failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
