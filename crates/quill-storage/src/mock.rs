//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::RwLock;

use crate::storage::{Location, Storage, StorageError, StorageErrorKind, Titles};
use crate::title::{Kind, Title};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores both representations in memory. Use the builder methods to seed
/// content or make writes of one kind fail.
///
/// # Example
///
/// ```ignore
/// use quill_storage::{Kind, MockStorage, Storage, Title};
///
/// let storage = MockStorage::new()
///     .with_content("hello", Kind::Source, "# Hi")
///     .with_failing_writes(Kind::Rendered);
/// ```
#[derive(Debug)]
pub struct MockStorage {
    root: PathBuf,
    contents: RwLock<HashMap<(Kind, Title), Vec<u8>>>,
    failing_writes: RwLock<HashSet<Kind>>,
    missing: RwLock<HashSet<Kind>>,
}

impl Default for MockStorage {
    fn default() -> Self {
        Self {
            root: PathBuf::from("mock"),
            contents: RwLock::new(HashMap::new()),
            failing_writes: RwLock::new(HashSet::new()),
            missing: RwLock::new(HashSet::new()),
        }
    }
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed content for one representation of a page.
    ///
    /// # Panics
    ///
    /// Panics if `title` is not a valid title or the internal lock is poisoned.
    #[must_use]
    pub fn with_content(self, title: &str, kind: Kind, content: impl Into<Vec<u8>>) -> Self {
        let title = Title::new(title).expect("invalid title in mock setup");
        self.contents
            .write()
            .unwrap()
            .insert((kind, title), content.into());
        self
    }

    /// Make every write of `kind` fail with a permission error.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failing_writes(self, kind: Kind) -> Self {
        self.failing_writes.write().unwrap().insert(kind);
        self
    }

    /// Make enumeration of `kind` report a missing storage area.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_missing_area(self, kind: Kind) -> Self {
        self.missing.write().unwrap().insert(kind);
        self
    }

    /// Stop failing writes of `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn heal_writes(&self, kind: Kind) {
        self.failing_writes.write().unwrap().remove(&kind);
    }

    /// Current content of one representation, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn content(&self, title: &Title, kind: Kind) -> Option<Vec<u8>> {
        self.contents
            .read()
            .unwrap()
            .get(&(kind, title.clone()))
            .cloned()
    }

    fn check_writable(&self, location: &Location) -> Result<(), StorageError> {
        if self.failing_writes.read().unwrap().contains(&location.kind()) {
            let err = StorageError::new(StorageErrorKind::PermissionDenied)
                .with_backend(BACKEND)
                .with_path(location.path());
            return Err(err);
        }
        Ok(())
    }
}

impl Storage for MockStorage {
    fn locate(&self, title: &Title, kind: Kind) -> Location {
        Location::under(&self.root, title, kind)
    }

    fn read(&self, location: &Location) -> Result<Vec<u8>, StorageError> {
        self.contents
            .read()
            .unwrap()
            .get(&(location.kind(), location.title().clone()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(location.path()).with_backend(BACKEND))
    }

    fn write(&self, location: &Location, bytes: &[u8]) -> Result<(), StorageError> {
        self.check_writable(location)?;
        self.contents
            .write()
            .unwrap()
            .insert((location.kind(), location.title().clone()), bytes.to_vec());
        Ok(())
    }

    fn enumerate(&self, kind: Kind) -> Result<Titles, StorageError> {
        if self.missing.read().unwrap().contains(&kind) {
            return Err(
                StorageError::not_found(self.root.join(kind.dir_name())).with_backend(BACKEND)
            );
        }
        let titles: Vec<Title> = self
            .contents
            .read()
            .unwrap()
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, title)| title.clone())
            .collect();
        Ok(Box::new(titles.into_iter()))
    }

    fn write_all(&self, writes: &[(Location, Vec<u8>)]) -> Result<(), StorageError> {
        // All or nothing: validate every location before touching the map.
        for (location, _) in writes {
            self.check_writable(location)?;
        }
        let mut contents = self.contents.write().unwrap();
        for (location, bytes) in writes {
            contents.insert((location.kind(), location.title().clone()), bytes.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(raw: &str) -> Title {
        Title::new(raw).unwrap()
    }

    #[test]
    fn test_seeded_content_is_readable() {
        let storage = MockStorage::new().with_content("hello", Kind::Source, "# Hi");
        let loc = storage.locate(&title("hello"), Kind::Source);

        assert_eq!(storage.read(&loc).unwrap(), b"# Hi");
    }

    #[test]
    fn test_read_missing() {
        let storage = MockStorage::new();
        let loc = storage.locate(&title("hello"), Kind::Rendered);

        let err = storage.read(&loc).unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Mock"));
    }

    #[test]
    fn test_failing_writes() {
        let storage = MockStorage::new().with_failing_writes(Kind::Rendered);
        let t = title("hello");
        let writes = vec![
            (storage.locate(&t, Kind::Source), b"src".to_vec()),
            (storage.locate(&t, Kind::Rendered), b"out".to_vec()),
        ];

        let err = storage.write_all(&writes).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
        assert!(storage.content(&t, Kind::Source).is_none());

        storage.heal_writes(Kind::Rendered);
        storage.write_all(&writes).unwrap();
        assert_eq!(storage.content(&t, Kind::Rendered), Some(b"out".to_vec()));
    }

    #[test]
    fn test_enumerate_by_kind() {
        let storage = MockStorage::new()
            .with_content("a", Kind::Source, "x")
            .with_content("b", Kind::Rendered, "x");

        let titles: Vec<Title> = storage.enumerate(Kind::Source).unwrap().collect();

        assert_eq!(titles, vec![title("a")]);
    }

    #[test]
    fn test_missing_area() {
        let storage = MockStorage::new().with_missing_area(Kind::Source);

        let err = storage.enumerate(Kind::Source).err().unwrap();

        assert!(err.is_not_found());
    }
}
