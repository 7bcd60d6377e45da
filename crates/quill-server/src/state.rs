//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use quill_pages::PageStore;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Page store; calls block, so handlers run them on the blocking pool.
    pub(crate) pages: Arc<PageStore>,
    /// Directory served under `/public/`.
    pub(crate) public_dir: PathBuf,
}
