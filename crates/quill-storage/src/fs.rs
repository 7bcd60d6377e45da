//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`], which keeps one file per `(title, kind)` pair under
//! a kind-specific subdirectory of the storage root.
//!
//! # Write protocol
//!
//! Every file is written to a hidden staging file in its target directory and
//! renamed into place, so readers never see a partially written file.
//!
//! Multi-file writes ([`Storage::write_all`]) to one title add a journal:
//!
//! 1. finish any commit still pending for the title;
//! 2. stage and `fsync` every payload;
//! 3. write `.journal/{title}.json` listing staged/target pairs (temp file +
//!    rename, this rename is the commit point);
//! 4. rename every staged file onto its target;
//! 5. remove the journal.
//!
//! A title has at most one journal, and every later write to the title
//! finishes it first, so a pending commit is never replayed over a newer one.
//! [`Storage::recover`] replays journals left behind by a crash or a failed
//! step 4 and deletes staging files from writes that never committed.
//!
//! # Root lock
//!
//! [`FsStorage::lock_exclusive`] takes an advisory lock on `{root}/.lock`
//! held for the lifetime of the storage. Processes that write or recover
//! take it so they never discard each other's staging files.

use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{Location, Storage, StorageError, StorageErrorKind, Titles};
use crate::title::{Kind, Title};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Directory under the root holding commit journals.
const JOURNAL_DIR: &str = ".journal";

/// Suffix of staging files (and uncommitted journals).
const STAGING_SUFFIX: &str = ".tmp";

/// Advisory lock file under the root.
const LOCK_FILE: &str = ".lock";

/// One staged file waiting to be renamed onto its target.
///
/// Paths are relative to the storage root so a data directory can be moved
/// between a crash and the recovery run.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct JournalEntry {
    staged: PathBuf,
    target: PathBuf,
}

/// Commit record for one multi-file write.
#[derive(Debug, Serialize, Deserialize)]
struct Journal {
    entries: Vec<JournalEntry>,
}

/// Borrowed form of [`Journal`] for serialization.
#[derive(Serialize)]
struct JournalRef<'a> {
    entries: &'a [JournalEntry],
}

/// Filesystem storage rooted at a data directory.
///
/// ```text
/// {root}/
/// +-- md/        # source, {title}.md
/// +-- txt/       # rendered, {title}.txt
/// +-- .journal/  # in-flight multi-file writes, {title}.json
/// +-- .lock      # held by the process that owns the root
/// ```
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use quill_storage::{FsStorage, Kind, Storage, Title};
///
/// let storage = FsStorage::new(PathBuf::from("blog_data"));
/// storage.ensure_layout()?;
/// let title = Title::new("hello")?;
/// storage.write(&storage.locate(&title, Kind::Source), b"# Hi")?;
/// ```
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
    /// Root lock, released on drop.
    lock: Option<File>,
}

impl FsStorage {
    /// Create a storage backend rooted at `root`.
    ///
    /// No I/O happens until the first operation; call
    /// [`ensure_layout`](Self::ensure_layout) to create the directories.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root, lock: None }
    }

    /// Take the exclusive root lock, released when the storage is dropped.
    ///
    /// Call after [`ensure_layout`](Self::ensure_layout).
    ///
    /// # Errors
    ///
    /// Returns a [`StorageErrorKind::Locked`] error if another storage holds
    /// the lock, or an I/O error if the lock file cannot be opened.
    pub fn lock_exclusive(mut self) -> Result<Self, StorageError> {
        let path = self.root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| io_error(e, &path))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                let err = StorageError::new(StorageErrorKind::Locked)
                    .with_path(path)
                    .with_backend(BACKEND);
                return Err(err);
            }
            Err(e) => return Err(io_error(e, &path)),
        }

        tracing::debug!(path = %path.display(), "Acquired storage lock");
        self.lock = Some(file);
        Ok(self)
    }

    /// Storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and one subdirectory per kind if they are missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a directory cannot be created.
    pub fn ensure_layout(&self) -> Result<(), StorageError> {
        if !self.root.is_dir() {
            tracing::info!(root = %self.root.display(), "Storage root does not exist, creating it");
        }
        for kind in Kind::ALL {
            let dir = self.root.join(kind.dir_name());
            fs::create_dir_all(&dir).map_err(|e| io_error(e, &dir))?;
        }
        Ok(())
    }

    fn journal_dir(&self) -> PathBuf {
        self.root.join(JOURNAL_DIR)
    }

    /// Journal recording the pending commit for `title`, if any.
    fn journal_path(&self, title: &Title) -> PathBuf {
        self.journal_dir().join(format!("{title}.json"))
    }

    /// Write `bytes` to a fresh staging file next to `target`.
    fn stage(target: &Path, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let dir = target.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(|e| io_error(e, dir))?;

        let staged = dir.join(staging_name());
        write_synced(&staged, bytes).map_err(|e| io_error(e, &staged))?;
        Ok(staged)
    }

    /// Stage the payload for `location` and describe it for the journal.
    fn stage_entry(&self, location: &Location, bytes: &[u8]) -> Result<JournalEntry, StorageError> {
        let target = self.relative(location.path())?;
        let staged = Self::stage(location.path(), bytes)?;
        let staged = self.relative(&staged)?;
        Ok(JournalEntry { staged, target })
    }

    fn discard_entries(&self, entries: &[JournalEntry]) {
        for entry in entries {
            remove_stale(&self.root.join(&entry.staged));
        }
    }

    /// Express `path` relative to the storage root for the journal.
    fn relative(&self, path: &Path) -> Result<PathBuf, StorageError> {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| invalid_path(path))
    }

    /// Resolve a journal path against the root, refusing anything that escapes it.
    fn resolve(&self, relative: &Path) -> Result<PathBuf, StorageError> {
        validate_path(relative)?;
        Ok(self.root.join(relative))
    }

    /// Durably record a commit for `title`. Returns the journal path.
    fn write_journal(
        &self,
        title: &Title,
        entries: &[JournalEntry],
    ) -> Result<PathBuf, StorageError> {
        let dir = self.journal_dir();
        fs::create_dir_all(&dir).map_err(|e| io_error(e, &dir))?;

        let payload = serde_json::to_vec(&JournalRef { entries }).map_err(|e| {
            StorageError::new(StorageErrorKind::Other)
                .with_backend(BACKEND)
                .with_source(e)
        })?;

        let staged = dir.join(staging_name());
        write_synced(&staged, &payload).map_err(|e| io_error(e, &staged))?;

        let path = self.journal_path(title);
        if let Err(e) = fs::rename(&staged, &path) {
            remove_stale(&staged);
            return Err(io_error(e, &path));
        }
        Ok(path)
    }

    /// Move every staged file of a committed journal onto its target.
    ///
    /// Entries whose staged file is gone were already applied.
    fn apply(&self, entries: &[JournalEntry]) -> Result<(), StorageError> {
        for entry in entries {
            let staged = self.resolve(&entry.staged)?;
            let target = self.resolve(&entry.target)?;
            match fs::rename(&staged, &target) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(staged = %staged.display(), "Staged file already applied");
                }
                Err(e) => return Err(io_error(e, &target)),
            }
        }
        Ok(())
    }

    /// Apply the committed journal at `path` and remove it.
    ///
    /// Returns `false` if there is no journal there or it cannot be parsed.
    fn replay(&self, path: &Path) -> Result<bool, StorageError> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(io_error(e, path)),
        };
        let journal: Journal = match serde_json::from_slice(&content) {
            Ok(journal) => journal,
            Err(e) => {
                tracing::warn!(
                    journal = %path.display(),
                    error = %e,
                    "Skipping unreadable journal"
                );
                return Ok(false);
            }
        };

        self.apply(&journal.entries)?;
        fs::remove_file(path).map_err(|e| io_error(e, path))?;
        tracing::info!(
            journal = %path.display(),
            files = journal.entries.len(),
            "Completed interrupted write"
        );
        Ok(true)
    }

    /// Finish the commit a failed earlier write left pending for `title`.
    fn finish_pending(&self, title: &Title) -> Result<(), StorageError> {
        let path = self.journal_path(title);
        if path.is_file() {
            self.replay(&path)?;
        }
        Ok(())
    }

    /// Replay committed journals. Returns how many were replayed.
    fn replay_journals(&self) -> Result<usize, StorageError> {
        let dir = self.journal_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_error(e, &dir)),
        };

        let mut replayed = 0;
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if self.replay(&path)? {
                    replayed += 1;
                }
            } else if is_staging_file(&entry.file_name()) {
                // Journal that never reached its commit rename.
                remove_stale(&path);
            }
        }
        Ok(replayed)
    }

    /// Delete staging files left by writes that never committed.
    fn discard_staging(&self) {
        for kind in Kind::ALL {
            let Ok(entries) = fs::read_dir(self.root.join(kind.dir_name())) else {
                continue;
            };
            for entry in entries.filter_map(Result::ok) {
                if is_staging_file(&entry.file_name()) {
                    remove_stale(&entry.path());
                }
            }
        }
    }
}

impl Storage for FsStorage {
    fn locate(&self, title: &Title, kind: Kind) -> Location {
        Location::under(&self.root, title, kind)
    }

    fn read(&self, location: &Location) -> Result<Vec<u8>, StorageError> {
        fs::read(location.path()).map_err(|e| io_error(e, location.path()))
    }

    fn write(&self, location: &Location, bytes: &[u8]) -> Result<(), StorageError> {
        self.finish_pending(location.title())?;

        let staged = Self::stage(location.path(), bytes)?;
        if let Err(e) = fs::rename(&staged, location.path()) {
            remove_stale(&staged);
            return Err(io_error(e, location.path()));
        }
        Ok(())
    }

    fn enumerate(&self, kind: Kind) -> Result<Titles, StorageError> {
        let dir = self.root.join(kind.dir_name());
        let entries = fs::read_dir(&dir).map_err(|e| io_error(e, &dir))?;
        let extension = kind.extension();

        Ok(Box::new(entries.filter_map(Result::ok).filter_map(
            move |entry| {
                if !entry.file_type().is_ok_and(|t| t.is_file()) {
                    return None;
                }
                title_from_file_name(&entry.file_name(), extension)
            },
        )))
    }

    /// Write every location of one title through the journal.
    ///
    /// If renaming fails after the commit point the error is returned and the
    /// commit stays pending. It is finished by the next write to the title or
    /// by [`recover`](Storage::recover).
    ///
    /// # Errors
    ///
    /// Returns an [`StorageErrorKind::InvalidPath`] error if the locations
    /// belong to more than one title.
    fn write_all(&self, writes: &[(Location, Vec<u8>)]) -> Result<(), StorageError> {
        let title = match writes {
            [] => return Ok(()),
            [(location, bytes)] => return self.write(location, bytes),
            [(first, _), rest @ ..] => {
                if let Some((other, _)) =
                    rest.iter().find(|(l, _)| l.title() != first.title())
                {
                    return Err(invalid_path(other.path()));
                }
                first.title()
            }
        };

        self.finish_pending(title)?;

        let mut entries = Vec::with_capacity(writes.len());
        for (location, bytes) in writes {
            match self.stage_entry(location, bytes) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    self.discard_entries(&entries);
                    return Err(e);
                }
            }
        }

        let journal = match self.write_journal(title, &entries) {
            Ok(path) => path,
            Err(e) => {
                self.discard_entries(&entries);
                return Err(e);
            }
        };

        if let Err(e) = self.apply(&entries) {
            tracing::warn!(
                title = %title,
                journal = %journal.display(),
                error = %e,
                "Commit left pending"
            );
            return Err(e);
        }
        fs::remove_file(&journal).map_err(|e| io_error(e, &journal))
    }

    fn recover(&self) -> Result<usize, StorageError> {
        if self.lock.is_none() {
            tracing::debug!(root = %self.root.display(), "Recovering without the root lock");
        }
        let replayed = self.replay_journals()?;
        self.discard_staging();
        Ok(replayed)
    }
}

/// Create a storage error from an I/O error, tagged with this backend.
fn io_error(err: std::io::Error, path: &Path) -> StorageError {
    StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
}

fn invalid_path(path: &Path) -> StorageError {
    StorageError::new(StorageErrorKind::InvalidPath)
        .with_path(path)
        .with_backend(BACKEND)
}

/// Reject relative paths that could escape the storage root.
fn validate_path(path: &Path) -> Result<(), StorageError> {
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if escapes {
        return Err(invalid_path(path));
    }
    Ok(())
}

fn staging_name() -> String {
    format!(".{}{STAGING_SUFFIX}", Uuid::new_v4())
}

fn is_staging_file(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n.starts_with('.') && n.ends_with(STAGING_SUFFIX))
}

/// Title for a file named `{title}.{extension}`, if the stem is a valid title.
fn title_from_file_name(name: &OsStr, extension: &str) -> Option<Title> {
    let stem = name.to_str()?.strip_suffix(extension)?.strip_suffix('.')?;
    Title::new(stem).ok()
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn remove_stale(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed stale staging file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staging file");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn title(raw: &str) -> Title {
        Title::new(raw).unwrap()
    }

    fn storage() -> (TempDir, FsStorage) {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path().join("data"));
        storage.ensure_layout().unwrap();
        (temp, storage)
    }

    fn titles(storage: &FsStorage, kind: Kind) -> HashSet<String> {
        storage
            .enumerate(kind)
            .unwrap()
            .map(Title::into_inner)
            .collect()
    }

    fn page_writes(storage: &FsStorage, raw: &str, version: &str) -> Vec<(Location, Vec<u8>)> {
        let t = title(raw);
        let rendered = format!("<p>{version}</p>").into_bytes();
        vec![
            (storage.locate(&t, Kind::Source), version.into()),
            (storage.locate(&t, Kind::Rendered), rendered),
        ]
    }

    fn save(storage: &FsStorage, raw: &str, version: &str) -> Result<(), StorageError> {
        storage.write_all(&page_writes(storage, raw, version))
    }

    fn read_text(storage: &FsStorage, t: &Title, kind: Kind) -> String {
        let bytes = storage.read(&storage.locate(t, kind)).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn read_pair(storage: &FsStorage, raw: &str) -> (String, String) {
        let t = title(raw);
        let source = read_text(storage, &t, Kind::Source);
        (source, read_text(storage, &t, Kind::Rendered))
    }

    fn pair(version: &str) -> (String, String) {
        (version.to_owned(), format!("<p>{version}</p>"))
    }

    /// Block `path` with a non-empty directory so renaming onto it fails.
    fn block(path: &Path) {
        fs::create_dir_all(path.join("blocker")).unwrap();
    }

    fn unblock(path: &Path) {
        fs::remove_dir_all(path).unwrap();
    }

    fn journals(storage: &FsStorage) -> Vec<String> {
        if storage.journal_dir().is_dir() {
            dir_names(&storage.journal_dir())
        } else {
            Vec::new()
        }
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_ensure_layout_creates_kind_dirs() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path().join("missing"));

        storage.ensure_layout().unwrap();

        assert!(temp.path().join("missing/md").is_dir());
        assert!(temp.path().join("missing/txt").is_dir());
    }

    #[test]
    fn test_ensure_layout_is_idempotent() {
        let (_temp, storage) = storage();
        fs::write(storage.root().join("md/keep.md"), "x").unwrap();

        storage.ensure_layout().unwrap();

        assert!(storage.root().join("md/keep.md").exists());
    }

    #[test]
    fn test_write_then_read() {
        let (_temp, storage) = storage();
        let loc = storage.locate(&title("hello"), Kind::Source);

        storage.write(&loc, b"# Hi\nworld").unwrap();

        assert_eq!(storage.read(&loc).unwrap(), b"# Hi\nworld");
        assert_eq!(
            fs::read(storage.root().join("md/hello.md")).unwrap(),
            b"# Hi\nworld"
        );
    }

    #[test]
    fn test_write_overwrites() {
        let (_temp, storage) = storage();
        let loc = storage.locate(&title("hello"), Kind::Source);

        storage.write(&loc, b"a much longer first version").unwrap();
        storage.write(&loc, b"v2").unwrap();

        assert_eq!(storage.read(&loc).unwrap(), b"v2");
    }

    #[test]
    fn test_write_leaves_no_staging_files() {
        let (_temp, storage) = storage();
        let loc = storage.locate(&title("hello"), Kind::Source);

        storage.write(&loc, b"content").unwrap();

        assert_eq!(dir_names(&storage.root().join("md")), vec!["hello.md"]);
    }

    #[test]
    fn test_write_creates_missing_kind_dir() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path().to_path_buf());
        let loc = storage.locate(&title("hello"), Kind::Rendered);

        storage.write(&loc, b"<p>hi</p>").unwrap();

        assert_eq!(storage.read(&loc).unwrap(), b"<p>hi</p>");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let (_temp, storage) = storage();
        let loc = storage.locate(&title("nope"), Kind::Rendered);

        let err = storage.read(&loc).unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Fs"));
        assert_eq!(err.path.as_deref(), Some(loc.path()));
    }

    #[test]
    fn test_enumerate_lists_titles_of_kind() {
        let (_temp, storage) = storage();
        for name in ["a", "b", "v1.2 notes"] {
            let loc = storage.locate(&title(name), Kind::Source);
            storage.write(&loc, b"x").unwrap();
        }
        let rendered = storage.locate(&title("only-rendered"), Kind::Rendered);
        storage.write(&rendered, b"x").unwrap();

        assert_eq!(
            titles(&storage, Kind::Source),
            HashSet::from(["a".to_owned(), "b".to_owned(), "v1.2 notes".to_owned()])
        );
        assert_eq!(
            titles(&storage, Kind::Rendered),
            HashSet::from(["only-rendered".to_owned()])
        );
    }

    #[test]
    fn test_enumerate_skips_foreign_files() {
        let (_temp, storage) = storage();
        let md = storage.root().join("md");
        fs::write(md.join("page.md"), "x").unwrap();
        fs::write(md.join("notes.txt"), "x").unwrap();
        fs::write(md.join(".abc.tmp"), "x").unwrap();
        fs::write(md.join(".hidden.md"), "x").unwrap();
        fs::write(md.join("md"), "x").unwrap();
        fs::create_dir(md.join("dir.md")).unwrap();

        assert_eq!(
            titles(&storage, Kind::Source),
            HashSet::from(["page".to_owned()])
        );
    }

    #[test]
    fn test_enumerate_is_restartable() {
        let (_temp, storage) = storage();
        let loc = storage.locate(&title("a"), Kind::Source);
        storage.write(&loc, b"x").unwrap();

        assert_eq!(storage.enumerate(Kind::Source).unwrap().count(), 1);
        assert_eq!(storage.enumerate(Kind::Source).unwrap().count(), 1);
    }

    #[test]
    fn test_enumerate_missing_dir_is_not_found() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path().join("absent"));

        let err = storage.enumerate(Kind::Source).err().unwrap();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_all_commits_every_file() {
        let (_temp, storage) = storage();
        let t = title("hello");
        let writes = vec![
            (storage.locate(&t, Kind::Source), b"# Hi".to_vec()),
            (storage.locate(&t, Kind::Rendered), b"<h1>Hi</h1>".to_vec()),
        ];

        storage.write_all(&writes).unwrap();

        assert_eq!(storage.read(&writes[0].0).unwrap(), b"# Hi");
        assert_eq!(storage.read(&writes[1].0).unwrap(), b"<h1>Hi</h1>");
        assert_eq!(dir_names(&storage.root().join("md")), vec!["hello.md"]);
        assert_eq!(dir_names(&storage.root().join("txt")), vec!["hello.txt"]);
        assert!(dir_names(&storage.journal_dir()).is_empty());
    }

    #[test]
    fn test_recover_rolls_forward_committed_journal() {
        let (_temp, storage) = storage();
        let t = title("hello");
        let source = storage.locate(&t, Kind::Source);
        let rendered = storage.locate(&t, Kind::Rendered);
        storage.write(&source, b"old").unwrap();
        storage.write(&rendered, b"<p>old</p>").unwrap();

        // Crash after the commit point: the source was already moved, the
        // rendered file is still staged.
        storage.write(&source, b"new").unwrap();
        let staged = FsStorage::stage(rendered.path(), b"<p>new</p>").unwrap();
        let entries = vec![
            JournalEntry {
                staged: PathBuf::from("md/.gone.tmp"),
                target: PathBuf::from("md/hello.md"),
            },
            JournalEntry {
                staged: storage.relative(&staged).unwrap(),
                target: PathBuf::from("txt/hello.txt"),
            },
        ];
        storage.write_journal(&t, &entries).unwrap();

        assert_eq!(storage.recover().unwrap(), 1);

        assert_eq!(storage.read(&source).unwrap(), b"new");
        assert_eq!(storage.read(&rendered).unwrap(), b"<p>new</p>");
        assert!(dir_names(&storage.journal_dir()).is_empty());
        assert_eq!(dir_names(&storage.root().join("txt")), vec!["hello.txt"]);
    }

    #[test]
    fn test_recover_discards_uncommitted_staging() {
        let (_temp, storage) = storage();
        let t = title("hello");
        let source = storage.locate(&t, Kind::Source);
        storage.write(&source, b"old").unwrap();

        // Crash before the commit point.
        FsStorage::stage(source.path(), b"new").unwrap();
        fs::create_dir_all(storage.journal_dir()).unwrap();
        fs::write(storage.journal_dir().join(".half.tmp"), b"{\"entr").unwrap();

        assert_eq!(storage.recover().unwrap(), 0);

        assert_eq!(storage.read(&source).unwrap(), b"old");
        assert_eq!(dir_names(&storage.root().join("md")), vec!["hello.md"]);
        assert!(dir_names(&storage.journal_dir()).is_empty());
    }

    #[test]
    fn test_recover_rejects_escaping_journal() {
        let (_temp, storage) = storage();
        let entries = vec![JournalEntry {
            staged: PathBuf::from("../outside.tmp"),
            target: PathBuf::from("md/x.md"),
        }];
        storage.write_journal(&title("x"), &entries).unwrap();

        let err = storage.recover().unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_recover_on_empty_root() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path().join("absent"));

        assert_eq!(storage.recover().unwrap(), 0);
    }

    #[test]
    fn test_write_all_rejects_mixed_titles() {
        let (_temp, storage) = storage();
        let writes = vec![
            (storage.locate(&title("a"), Kind::Source), b"a".to_vec()),
            (storage.locate(&title("b"), Kind::Rendered), b"b".to_vec()),
        ];

        let err = storage.write_all(&writes).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidPath);
        assert!(dir_names(&storage.root().join("md")).is_empty());
        assert!(dir_names(&storage.root().join("txt")).is_empty());
    }

    #[test]
    fn test_write_all_staging_failure_discards_staged_files() {
        let (_temp, storage) = storage();
        save(&storage, "hello", "v1").unwrap();
        let txt = storage.root().join("txt");
        fs::remove_dir_all(&txt).unwrap();
        fs::write(&txt, "not a directory").unwrap();

        assert!(save(&storage, "hello", "v2").is_err());

        assert_eq!(dir_names(&storage.root().join("md")), vec!["hello.md"]);
        assert_eq!(fs::read(storage.root().join("md/hello.md")).unwrap(), b"v1");
        assert!(journals(&storage).is_empty());
    }

    #[test]
    fn test_write_all_journal_failure_discards_staged_files() {
        let (_temp, storage) = storage();
        save(&storage, "hello", "v1").unwrap();
        let journal = storage.journal_path(&title("hello"));
        block(&journal);

        assert!(save(&storage, "hello", "v2").is_err());

        assert_eq!(read_pair(&storage, "hello"), pair("v1"));
        assert_eq!(dir_names(&storage.root().join("md")), vec!["hello.md"]);
        assert_eq!(dir_names(&storage.root().join("txt")), vec!["hello.txt"]);
        assert_eq!(journals(&storage), vec!["hello.json"]);
        assert!(journal.is_dir());
    }

    #[test]
    fn test_write_all_apply_failure_leaves_commit_pending() {
        let (_temp, storage) = storage();
        save(&storage, "hello", "v1").unwrap();
        let rendered = storage.root().join("txt/hello.txt");
        fs::remove_file(&rendered).unwrap();
        block(&rendered);

        assert!(save(&storage, "hello", "v2").is_err());
        assert_eq!(journals(&storage), vec!["hello.json"]);

        unblock(&rendered);
        assert_eq!(storage.recover().unwrap(), 1);

        assert_eq!(read_pair(&storage, "hello"), pair("v2"));
        assert!(journals(&storage).is_empty());
        assert_eq!(dir_names(&storage.root().join("md")), vec!["hello.md"]);
        assert_eq!(dir_names(&storage.root().join("txt")), vec!["hello.txt"]);
    }

    #[test]
    fn test_pending_commit_never_overrides_later_write_all() {
        let (_temp, storage) = storage();
        save(&storage, "hello", "v1").unwrap();
        let source = storage.root().join("md/hello.md");
        fs::remove_file(&source).unwrap();
        block(&source);
        assert!(save(&storage, "hello", "v2").is_err());
        unblock(&source);

        save(&storage, "hello", "v3").unwrap();
        assert_eq!(read_pair(&storage, "hello"), pair("v3"));

        assert_eq!(storage.recover().unwrap(), 0);
        assert_eq!(read_pair(&storage, "hello"), pair("v3"));
        assert!(journals(&storage).is_empty());
        assert_eq!(dir_names(&storage.root().join("md")), vec!["hello.md"]);
    }

    #[test]
    fn test_pending_commit_never_overrides_later_write() {
        let (_temp, storage) = storage();
        save(&storage, "hello", "v1").unwrap();
        let rendered = storage.root().join("txt/hello.txt");
        fs::remove_file(&rendered).unwrap();
        block(&rendered);
        assert!(save(&storage, "hello", "v2").is_err());
        unblock(&rendered);

        let location = storage.locate(&title("hello"), Kind::Rendered);
        storage.write(&location, b"<p>rebuilt</p>").unwrap();
        storage.recover().unwrap();

        assert_eq!(
            read_pair(&storage, "hello"),
            ("v2".to_owned(), "<p>rebuilt</p>".to_owned())
        );
        assert!(journals(&storage).is_empty());
    }

    #[test]
    fn test_pending_commit_blocks_later_writes_until_cleared() {
        let (_temp, storage) = storage();
        save(&storage, "hello", "v1").unwrap();
        let source = storage.root().join("md/hello.md");
        fs::remove_file(&source).unwrap();
        block(&source);
        assert!(save(&storage, "hello", "v2").is_err());

        assert!(save(&storage, "hello", "v3").is_err());
        save(&storage, "other", "x").unwrap();

        assert_eq!(journals(&storage), vec!["hello.json"]);
    }

    #[test]
    fn test_lock_exclusive_excludes_second_owner() {
        let (temp, storage) = storage();
        let first = storage.lock_exclusive().unwrap();
        assert!(first.lock.is_some());

        let err = FsStorage::new(temp.path().join("data"))
            .lock_exclusive()
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::Locked);

        drop(first);
        let second = FsStorage::new(temp.path().join("data"))
            .lock_exclusive()
            .unwrap();
        assert!(second.lock.is_some());
    }

    #[test]
    fn test_lock_file_is_not_a_page() {
        let (_temp, storage) = storage();
        let storage = storage.lock_exclusive().unwrap();

        assert!(storage.root().join(".lock").is_file());
        assert!(titles(&storage, Kind::Source).is_empty());
        assert_eq!(storage.recover().unwrap(), 0);
    }

    #[test]
    fn test_title_from_file_name() {
        let name = |n: &str| title_from_file_name(OsStr::new(n), "md").map(Title::into_inner);

        assert_eq!(name("hello.md"), Some("hello".to_owned()));
        assert_eq!(name("a.b.md"), Some("a.b".to_owned()));
        assert_eq!(name("hello.txt"), None);
        assert_eq!(name(".md"), None);
        assert_eq!(name("md"), None);
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path(Path::new("md/a.md")).is_ok());
        assert!(validate_path(Path::new("../a")).is_err());
        assert!(validate_path(Path::new("/etc/passwd")).is_err());
    }
}
