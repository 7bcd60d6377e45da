//! Page titles and representation kinds.
//!
//! A [`Title`] doubles as the on-disk filename stem, so it is validated once at
//! construction and trusted everywhere after that.

use std::borrow::Borrow;
use std::fmt;

/// Longest accepted title in bytes.
///
/// Leaves room for the extension and staging suffixes under the common
/// 255-byte filename limit.
pub const MAX_TITLE_LEN: usize = 200;

/// Reason a string was rejected as a page title.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TitleError {
    #[error("title cannot be empty")]
    Empty,
    #[error("title is {len} bytes long, limit is {MAX_TITLE_LEN}")]
    TooLong { len: usize },
    #[error("title cannot start with '.'")]
    LeadingDot,
    #[error("title contains forbidden character {0:?}")]
    ForbiddenChar(char),
}

/// Validated page title.
///
/// Guaranteed to be a single safe path component: non-empty, no separators,
/// no control characters, no leading dot (which also rules out `.` and `..`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Title(String);

impl Title {
    /// Validate and wrap a title.
    pub fn new(raw: impl Into<String>) -> Result<Self, TitleError> {
        let raw = raw.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    /// Title as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the title, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn validate(raw: &str) -> Result<(), TitleError> {
    if raw.is_empty() {
        return Err(TitleError::Empty);
    }
    if raw.len() > MAX_TITLE_LEN {
        return Err(TitleError::TooLong { len: raw.len() });
    }
    if raw.starts_with('.') {
        return Err(TitleError::LeadingDot);
    }
    if let Some(c) = raw
        .chars()
        .find(|&c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(TitleError::ForbiddenChar(c));
    }
    Ok(())
}

impl TryFrom<&str> for Title {
    type Error = TitleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Title {
    type Error = TitleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Title {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Which representation of a page a location refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Author-entered markdown.
    Source,
    /// HTML derived from the source by the renderer.
    Rendered,
}

impl Kind {
    /// Every kind, in bootstrap order.
    pub const ALL: [Kind; 2] = [Kind::Source, Kind::Rendered];

    /// Subdirectory holding files of this kind.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Source => "md",
            Self::Rendered => "txt",
        }
    }

    /// File extension for this kind.
    #[must_use]
    pub fn extension(self) -> &'static str {
        // Same as the directory names, kept separate so the two can diverge.
        match self {
            Self::Source => "md",
            Self::Rendered => "txt",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Rendered => f.write_str("rendered"),
        }
    }
}
