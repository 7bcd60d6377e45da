//! CLI error types.

use std::path::PathBuf;

use quill_config::ConfigError;
use quill_pages::PageError;
use quill_storage::TitleError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Page(#[from] PageError),

    #[error("{0}")]
    Title(#[from] TitleError),

    #[error("{} is in use by another process (is `quill serve` running?)", .0.display())]
    StoreBusy(PathBuf),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Validation(String),
}
