//! Page model.

use std::borrow::Cow;

use quill_storage::Title;

/// A page as returned by the store.
///
/// Only the representation the operation asked for is loaded; the other
/// field is `None`. Pages from [`PageStore::list`](crate::PageStore::list)
/// carry the title only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page title.
    pub title: Title,
    /// Author-entered markdown, when loaded.
    pub source: Option<Vec<u8>>,
    /// Rendered HTML, when loaded.
    pub rendered: Option<Vec<u8>>,
}

impl Page {
    /// Title-only page.
    #[must_use]
    pub fn stub(title: Title) -> Self {
        Self {
            title,
            source: None,
            rendered: None,
        }
    }

    /// Source as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn source_text(&self) -> Option<Cow<'_, str>> {
        self.source.as_deref().map(String::from_utf8_lossy)
    }

    /// Rendered HTML as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn rendered_html(&self) -> Option<Cow<'_, str>> {
        self.rendered.as_deref().map(String::from_utf8_lossy)
    }
}

/// Sync state of a page's two representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Nothing stored under this title.
    Absent,
    /// Rendered output matches the current source.
    Consistent,
    /// Source stored, rendered output missing.
    SourceOnly,
    /// Rendered output stored without a source.
    RenderedOnly,
    /// Both stored, but the rendered output does not match the source.
    Stale,
}

impl PageState {
    /// Whether the page needs a rebuild (or manual attention).
    #[must_use]
    pub fn needs_attention(self) -> bool {
        !matches!(self, Self::Absent | Self::Consistent)
    }
}

impl std::fmt::Display for PageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Absent => "absent",
            Self::Consistent => "consistent",
            Self::SourceOnly => "source only",
            Self::RenderedOnly => "rendered only",
            Self::Stale => "stale",
        };
        f.write_str(label)
    }
}
