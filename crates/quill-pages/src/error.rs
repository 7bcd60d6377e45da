//! Page store error types.

use quill_renderer::RenderError;
use quill_storage::{Kind, StorageError, Title};

/// Page store error.
///
/// Keeps "nothing stored", "bad content" and "bad disk" apart so callers can
/// react to each differently.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// No representation of the requested kind is stored for the title.
    #[error("No {kind} stored for page '{title}'")]
    NotFound {
        /// Requested title.
        title: Title,
        /// Requested representation.
        kind: Kind,
    },

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Source could not be rendered.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl PageError {
    /// Whether this error means the page (or representation) does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = PageError::NotFound {
            title: Title::new("hello").unwrap(),
            kind: Kind::Rendered,
        };

        assert_eq!(err.to_string(), "No rendered stored for page 'hello'");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_render_error_is_not_not_found() {
        let err = PageError::from(RenderError::TooLarge { size: 2, limit: 1 });

        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Render error: source is 2 bytes, limit is 1"
        );
    }
}
