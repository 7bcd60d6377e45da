//! Page storage for Quill.
//!
//! Every page has two representations, the markdown source and the rendered
//! HTML. This crate maps a `(title, kind)` pair to a storage [`Location`] and
//! persists raw bytes there. It does not know how to render; keeping the two
//! representations in sync is the job of `quill-pages`.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Title`] and [`Kind`], the validated addressing inputs
//! - [`Storage`] trait with `locate()`, `read()`, `write()`, `enumerate()`,
//!   `write_all()` and `recover()`
//! - [`FsStorage`] for the filesystem, with journaled multi-file writes
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use quill_storage::{FsStorage, Kind, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("blog_data"));
//! for title in storage.enumerate(Kind::Source)? {
//!     println!("{title}");
//! }
//! ```

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;
mod title;

pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{ErrorStatus, Location, Storage, StorageError, StorageErrorKind, Titles};
pub use title::{Kind, MAX_TITLE_LEN, Title, TitleError};
