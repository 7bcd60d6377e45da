//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod rebuild;
pub(crate) mod serve;

use std::path::PathBuf;

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_pages::{PageError, PageStore};
use quill_server::{open_page_store, open_page_store_read_only, renderer_from_config};
use quill_storage::StorageErrorKind;

pub(crate) use check::CheckArgs;
pub(crate) use rebuild::RebuildArgs;
pub(crate) use serve::ServeArgs;

use crate::error::CliError;

/// Options shared by commands that work on the page store directly.
#[derive(Args)]
pub(crate) struct StoreArgs {
    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage root directory (overrides config).
    #[arg(short, long, env = "QUILL_ROOT")]
    root: Option<PathBuf>,
}

impl StoreArgs {
    /// Open the page store for writing.
    ///
    /// Fails instead of waiting when another process, such as a running
    /// `quill serve`, holds the storage root.
    pub(crate) fn open_exclusive(self) -> Result<PageStore, CliError> {
        let config = self.load()?;
        let root = config.storage_resolved.root;
        let renderer = renderer_from_config(&config.renderer);
        match open_page_store(&root, renderer) {
            Err(PageError::Storage(err)) if err.kind == StorageErrorKind::Locked => {
                Err(CliError::StoreBusy(root))
            }
            result => Ok(result?),
        }
    }

    /// Open the page store for reading, next to any running server.
    pub(crate) fn open_read_only(self) -> Result<PageStore, CliError> {
        let config = self.load()?;
        Ok(open_page_store_read_only(
            &config.storage_resolved.root,
            renderer_from_config(&config.renderer),
        ))
    }

    fn load(self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            storage_root: self.root,
            ..Default::default()
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}
