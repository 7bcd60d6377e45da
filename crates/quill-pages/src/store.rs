//! The page store.
//!
//! [`PageStore`] is the only component that knows a page has two
//! representations. It guarantees that the rendered output is always the
//! rendering of the most recently saved source:
//!
//! - `save` renders before writing anything, so bad content never reaches
//!   storage;
//! - both representations are committed through [`Storage::write_all`], which
//!   the filesystem backend journals so a crash cannot leave a mix;
//! - saves to the same title are serialized by a per-title lock, so two
//!   concurrent savers cannot interleave their writes.
//!
//! Reads take no lock. A reader racing a save sees the old or the new file.

use std::collections::BTreeSet;
use std::sync::Arc;

use quill_renderer::HtmlRenderer;
use quill_storage::{Kind, Storage, Title, Titles};

use crate::error::PageError;
use crate::locks::TitleLocks;
use crate::page::{Page, PageState};

/// Outcome of [`PageStore::rebuild_all`].
#[derive(Debug, Default)]
pub struct RebuildReport {
    /// Pages whose rendered output was regenerated.
    pub rebuilt: Vec<Title>,
    /// Pages that could not be rebuilt.
    pub failed: Vec<(Title, PageError)>,
}

/// Coordinates storage and rendering of pages.
pub struct PageStore {
    storage: Arc<dyn Storage>,
    renderer: HtmlRenderer,
    locks: TitleLocks,
}

impl PageStore {
    /// Create a page store over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, renderer: HtmlRenderer) -> Self {
        Self {
            storage,
            renderer,
            locks: TitleLocks::default(),
        }
    }

    /// Create a page store and finish any writes interrupted by a crash.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Storage`] if recovery fails.
    pub fn open(storage: Arc<dyn Storage>, renderer: HtmlRenderer) -> Result<Self, PageError> {
        let recovered = storage.recover()?;
        if recovered > 0 {
            tracing::info!(recovered, "Recovered interrupted page writes");
        }
        Ok(Self::new(storage, renderer))
    }

    /// Fetch the rendered representation of a page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotFound`] if the page has no rendered output and
    /// [`PageError::Storage`] if it cannot be read.
    pub fn get(&self, title: &Title) -> Result<Page, PageError> {
        let rendered = self.read(title, Kind::Rendered)?;
        Ok(Page {
            title: title.clone(),
            source: None,
            rendered: Some(rendered),
        })
    }

    /// Fetch the source representation of a page, for editing.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotFound`] if the page has no source and
    /// [`PageError::Storage`] if it cannot be read.
    pub fn get_source(&self, title: &Title) -> Result<Page, PageError> {
        let source = self.read(title, Kind::Source)?;
        Ok(Page {
            title: title.clone(),
            source: Some(source),
            rendered: None,
        })
    }

    /// Every page with a stored source, as title-only stubs.
    ///
    /// Unordered. Empty when nothing is stored or the storage area is missing.
    pub fn list(&self) -> impl Iterator<Item = Page> {
        self.titles(Kind::Source).map(Page::stub)
    }

    /// Save a page, replacing both representations.
    ///
    /// The source is rendered first; if that fails nothing is written and the
    /// page keeps its previous content. Concurrent saves to the same title are
    /// applied one after the other, each in full.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Render`] for content that cannot be rendered and
    /// [`PageError::Storage`] if the commit fails.
    pub fn save(&self, title: &Title, source: &[u8]) -> Result<(), PageError> {
        self.locks.with_lock(title, || {
            let rendered = self.render(title, source)?;
            let writes = vec![
                (self.storage.locate(title, Kind::Source), source.to_vec()),
                (self.storage.locate(title, Kind::Rendered), rendered),
            ];
            self.storage.write_all(&writes)?;
            tracing::info!(title = %title, bytes = source.len(), "Saved page");
            Ok(())
        })
    }

    /// Inspect whether a page's representations are in sync.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Storage`] if either representation cannot be read.
    pub fn state(&self, title: &Title) -> Result<PageState, PageError> {
        let source = self.read_optional(title, Kind::Source)?;
        let rendered = self.read_optional(title, Kind::Rendered)?;

        let state = match (source, rendered) {
            (None, None) => PageState::Absent,
            (Some(_), None) => PageState::SourceOnly,
            (None, Some(_)) => PageState::RenderedOnly,
            (Some(source), Some(rendered)) => match self.renderer.render(&source) {
                Ok(expected) if expected == rendered => PageState::Consistent,
                _ => PageState::Stale,
            },
        };
        Ok(state)
    }

    /// State of every title with at least one stored representation, sorted by title.
    ///
    /// # Errors
    ///
    /// Returns the first [`PageError`] raised while inspecting a page.
    pub fn audit(&self) -> Result<Vec<(Title, PageState)>, PageError> {
        let titles: BTreeSet<Title> = self
            .titles(Kind::Source)
            .chain(self.titles(Kind::Rendered))
            .collect();

        titles
            .into_iter()
            .map(|title| {
                let state = self.state(&title)?;
                Ok((title, state))
            })
            .collect()
    }

    /// Regenerate a page's rendered output from its stored source.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotFound`] if no source is stored, otherwise as
    /// [`save`](Self::save).
    pub fn rebuild(&self, title: &Title) -> Result<(), PageError> {
        self.locks.with_lock(title, || {
            let source = self.read(title, Kind::Source)?;
            let rendered = self.render(title, &source)?;
            let location = self.storage.locate(title, Kind::Rendered);
            self.storage.write(&location, &rendered)?;
            tracing::info!(title = %title, "Rebuilt page");
            Ok(())
        })
    }

    /// Regenerate the rendered output of every page with a stored source.
    pub fn rebuild_all(&self) -> RebuildReport {
        let mut report = RebuildReport::default();
        for page in self.list() {
            match self.rebuild(&page.title) {
                Ok(()) => report.rebuilt.push(page.title),
                Err(e) => {
                    tracing::warn!(title = %page.title, error = %e, "Failed to rebuild page");
                    report.failed.push((page.title, e));
                }
            }
        }
        report
    }

    fn render(&self, title: &Title, source: &[u8]) -> Result<Vec<u8>, PageError> {
        self.renderer.render(source).map_err(|e| {
            tracing::warn!(title = %title, error = %e, "Failed to render page");
            PageError::Render(e)
        })
    }

    fn read(&self, title: &Title, kind: Kind) -> Result<Vec<u8>, PageError> {
        let location = self.storage.locate(title, kind);
        self.storage.read(&location).map_err(|e| {
            if e.is_not_found() {
                PageError::NotFound {
                    title: title.clone(),
                    kind,
                }
            } else {
                PageError::Storage(e)
            }
        })
    }

    fn read_optional(&self, title: &Title, kind: Kind) -> Result<Option<Vec<u8>>, PageError> {
        match self.read(title, kind) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Titles with a stored representation of `kind`; empty on any failure.
    fn titles(&self, kind: Kind) -> Titles {
        match self.storage.enumerate(kind) {
            Ok(titles) => titles,
            Err(e) if e.is_not_found() => {
                tracing::debug!(%kind, "Storage area missing, no pages");
                Box::new(std::iter::empty())
            }
            Err(e) => {
                tracing::warn!(%kind, error = %e, "Failed to enumerate pages");
                Box::new(std::iter::empty())
            }
        }
    }
}
