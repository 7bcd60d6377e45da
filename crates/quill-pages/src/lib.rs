//! Dual-representation page store for Quill.
//!
//! Pages are stored twice: the markdown source the author wrote and the HTML
//! rendered from it. [`PageStore`] keeps the two in sync on top of any
//! [`Storage`](quill_storage::Storage) backend and an
//! [`HtmlRenderer`](quill_renderer::HtmlRenderer).
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use quill_pages::PageStore;
//! use quill_renderer::HtmlRenderer;
//! use quill_storage::{FsStorage, Title};
//!
//! let store = PageStore::open(
//!     Arc::new(FsStorage::new(PathBuf::from("blog_data"))),
//!     HtmlRenderer::new(),
//! )?;
//! let title = Title::new("hello")?;
//! store.save(&title, b"# Hi\nworld")?;
//! let page = store.get(&title)?;
//! ```

mod error;
mod locks;
mod page;
mod store;

pub use error::PageError;
pub use page::{Page, PageState};
pub use store::{PageStore, RebuildReport};
