//! HTTP server for the Quill wiki.
//!
//! Serves the page list, viewer and editor, accepts page saves, and hands
//! out static assets from the public directory.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use quill_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         storage_root: PathBuf::from("blog_data"),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (quill-server)
//!                        │
//!                        ├─► /list /view /edit /save ──► PageStore (quill-pages)
//!                        │                                   ├─► HtmlRenderer
//!                        │                                   └─► FsStorage (md/ + txt/)
//!                        │
//!                        └─► /public/* ──► public directory
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;
mod static_files;
mod templates;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use quill_config::RendererConfig;
use quill_pages::{PageError, PageStore};
use quill_renderer::HtmlRenderer;
use quill_storage::FsStorage;
use state::AppState;

pub use error::ServerError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory holding the page store.
    pub storage_root: PathBuf,
    /// Directory served under `/public/`.
    pub public_dir: PathBuf,
    /// Markdown renderer used for saved pages.
    pub renderer: HtmlRenderer,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            storage_root: PathBuf::from("blog_data"),
            public_dir: PathBuf::from("public"),
            renderer: HtmlRenderer::new(),
        }
    }
}

/// Run the server.
///
/// Prepares the storage layout, finishes interrupted writes, then serves until
/// Ctrl-C.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pages = Arc::new(open_page_store(&config.storage_root, config.renderer)?);

    if !config.public_dir.is_dir() {
        tracing::warn!(
            path = %config.public_dir.display(),
            "Public directory does not exist, static files will not be served"
        );
    }

    let state = Arc::new(AppState {
        pages,
        public_dir: config.public_dir,
    });
    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Open the filesystem page store under `root` for writing.
///
/// Creates the layout, takes the root lock for the lifetime of the store and
/// finishes interrupted writes.
///
/// # Errors
///
/// Returns [`PageError::Storage`] if the layout cannot be created, another
/// process holds the root, or recovery fails.
pub fn open_page_store(root: &Path, renderer: HtmlRenderer) -> Result<PageStore, PageError> {
    let storage = FsStorage::new(root.to_path_buf());
    storage.ensure_layout()?;
    let storage = storage.lock_exclusive()?;
    PageStore::open(Arc::new(storage), renderer)
}

/// Open the page store under `root` for reading only.
///
/// Takes no lock and performs no recovery, so it is safe next to a running
/// server. Pending writes of that server may show up as inconsistent pages.
#[must_use]
pub fn open_page_store_read_only(root: &Path, renderer: HtmlRenderer) -> PageStore {
    PageStore::new(Arc::new(FsStorage::new(root.to_path_buf())), renderer)
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Build the markdown renderer described by the `[renderer]` config section.
#[must_use]
pub fn renderer_from_config(config: &RendererConfig) -> HtmlRenderer {
    let renderer = HtmlRenderer::new()
        .with_gfm(config.gfm)
        .with_raw_html(config.raw_html)
        .with_heading_ids(config.heading_ids);
    match config.max_source_bytes {
        Some(limit) => renderer.with_max_source_bytes(limit),
        None => renderer,
    }
}

/// Create server configuration from Quill config.
#[must_use]
pub fn server_config_from_quill_config(config: &quill_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        storage_root: config.storage_resolved.root.clone(),
        public_dir: config.public_resolved.dir.clone(),
        renderer: renderer_from_config(&config.renderer),
    }
}
