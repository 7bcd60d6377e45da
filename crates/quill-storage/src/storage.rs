//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait for addressing and persisting the two
//! representations of a page, along with [`StorageError`] for unified error
//! handling across backends.
//!
//! # Addressing
//!
//! Every `(title, kind)` pair maps to exactly one [`Location`]:
//!
//! ```text
//! {root}/md/{title}.md     source
//! {root}/txt/{title}.txt   rendered
//! ```

use std::path::{Path, PathBuf};

use crate::title::{Kind, Title};

/// Storage location of one representation of one page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    title: Title,
    kind: Kind,
    path: PathBuf,
}

impl Location {
    /// Compute the location of `title`'s `kind` representation under `root`.
    ///
    /// Pure: performs no I/O.
    #[must_use]
    pub fn under(root: &Path, title: &Title, kind: Kind) -> Self {
        let path = root
            .join(kind.dir_name())
            .join(format!("{title}.{}", kind.extension()));
        Self {
            title: title.clone(),
            kind,
            path,
        }
    }

    /// Page title this location belongs to.
    #[must_use]
    pub fn title(&self) -> &Title {
        &self.title
    }

    /// Representation kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Backend path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lazy sequence of titles produced by [`Storage::enumerate`].
pub type Titles = Box<dyn Iterator<Item = Title> + Send>;

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Resource already exists.
    AlreadyExists,
    /// Invalid path or identifier.
    InvalidPath,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Another process holds the storage lock.
    Locked,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid path, permissions).
    #[default]
    Permanent,
    /// Retry immediately (timeout, interrupted).
    Temporary,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Whether this error means the resource is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => StorageErrorKind::AlreadyExists,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            _ => StorageErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => {
                ErrorStatus::Temporary
            }
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Locked => "Locked by another process",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Storage abstraction over the two representations of every page.
///
/// Implementations own the mapping from `(title, kind)` to a backend location
/// and the byte-level persistence at that location. They know nothing about
/// rendering; keeping source and rendered output in sync is the caller's job.
pub trait Storage: Send + Sync {
    /// Map a title and representation kind to its location. Pure.
    fn locate(&self, title: &Title, kind: Kind) -> Location;

    /// Read the full contents at `location`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageErrorKind::NotFound`] error if nothing is stored there,
    /// or another kind if the backend fails.
    fn read(&self, location: &Location) -> Result<Vec<u8>, StorageError>;

    /// Replace the contents at `location`.
    ///
    /// A concurrent reader observes either the previous or the new contents.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend rejects the write.
    fn write(&self, location: &Location, bytes: &[u8]) -> Result<(), StorageError>;

    /// Titles that currently have a persisted representation of `kind`.
    ///
    /// The sequence is lazy and unsorted. Call again to restart it.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageErrorKind::NotFound`] error if the storage area for
    /// `kind` does not exist.
    fn enumerate(&self, kind: Kind) -> Result<Titles, StorageError>;

    /// Write several locations as one unit.
    ///
    /// The default implementation writes sequentially and gives no guarantee
    /// if it fails halfway. Backends that can do better override it.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError`] encountered.
    fn write_all(&self, writes: &[(Location, Vec<u8>)]) -> Result<(), StorageError> {
        for (location, bytes) in writes {
            self.write(location, bytes)?;
        }
        Ok(())
    }

    /// Finish or discard multi-location writes interrupted by a crash.
    ///
    /// Returns the number of interrupted writes that were completed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if recovery state cannot be read or applied.
    fn recover(&self) -> Result<usize, StorageError> {
        Ok(0)
    }
}
