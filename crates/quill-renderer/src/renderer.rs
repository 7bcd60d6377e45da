//! Markdown to HTML renderer.

use pulldown_cmark::{Event, Options, Parser};

use crate::html::{assign_heading_ids, escape_raw_html};

/// Default upper bound on source size accepted by [`HtmlRenderer::render`].
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 1024 * 1024;

/// Source content that cannot be rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Source bytes are not UTF-8 text.
    #[error("source is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Source exceeds the configured size limit.
    #[error("source is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Size of the rejected source.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// Markdown to HTML renderer.
///
/// Rendering is deterministic: the same source and options always produce the
/// same bytes. The output is meant to be embedded into a page verbatim.
///
/// # Example
///
/// ```
/// use quill_renderer::HtmlRenderer;
///
/// let html = HtmlRenderer::new().render(b"# Hi\nworld").unwrap();
/// assert_eq!(html, b"<h1 id=\"hi\">Hi</h1>\n<p>world</p>\n");
/// ```
#[derive(Clone, Debug)]
pub struct HtmlRenderer {
    gfm: bool,
    raw_html: bool,
    heading_ids: bool,
    max_source_bytes: usize,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            gfm: true,
            raw_html: true,
            heading_ids: true,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }
}

impl HtmlRenderer {
    /// Create a renderer with GFM, raw HTML and heading ids enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    /// - Footnotes (`text[^1]`)
    /// - Blockquote alerts (`> [!NOTE]`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Pass raw HTML in the source through (default) or escape it as text.
    #[must_use]
    pub fn with_raw_html(mut self, enabled: bool) -> Self {
        self.raw_html = enabled;
        self
    }

    /// Add slug `id` attributes to headings (default on).
    #[must_use]
    pub fn with_heading_ids(mut self, enabled: bool) -> Self {
        self.heading_ids = enabled;
        self
    }

    /// Reject sources larger than `limit` bytes.
    #[must_use]
    pub fn with_max_source_bytes(mut self, limit: usize) -> Self {
        self.max_source_bytes = limit;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Render source bytes to HTML bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TooLarge`] if the source exceeds the size limit and
    /// [`RenderError::InvalidUtf8`] if it is not text.
    pub fn render(&self, source: &[u8]) -> Result<Vec<u8>, RenderError> {
        if source.len() > self.max_source_bytes {
            return Err(RenderError::TooLarge {
                size: source.len(),
                limit: self.max_source_bytes,
            });
        }
        let markdown = std::str::from_utf8(source)?;
        Ok(self.render_markdown(markdown).into_bytes())
    }

    /// Render markdown text to an HTML string. Never fails.
    #[must_use]
    pub fn render_markdown(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut events: Vec<Event<'_>> = if self.raw_html {
            parser.collect()
        } else {
            parser.map(escape_raw_html).collect()
        };
        if self.heading_ids {
            assign_heading_ids(&mut events);
        }

        let mut html = String::with_capacity(markdown.len() + markdown.len() / 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());
        html
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(markdown: &str) -> String {
        String::from_utf8(HtmlRenderer::new().render(markdown.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(
            render("# Hi\nworld"),
            "<h1 id=\"hi\">Hi</h1>\n<p>world</p>\n"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let source = "# Title\n\nSome *text* with a [link](https://example.com).\n\n- a\n- b\n";
        let renderer = HtmlRenderer::new();

        assert_eq!(
            renderer.render(source.as_bytes()).unwrap(),
            renderer.render(source.as_bytes()).unwrap()
        );
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_gfm_table_and_strikethrough() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");

        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_gfm_footnotes() {
        let html = render("See note[^1].\n\n[^1]: The note.");

        assert!(html.contains("footnote-reference"));
        assert!(html.contains("footnote-definition"));
        assert!(html.contains("The note."));
    }

    #[test]
    fn test_gfm_disabled() {
        let renderer = HtmlRenderer::new().with_gfm(false);
        let html = renderer.render_markdown("~~gone~~ note[^1]\n\n[^1]: x");

        assert!(!html.contains("<del>"));
        assert!(!html.contains("footnote-definition"));
    }

    #[test]
    fn test_task_list() {
        let html = render("- [x] done\n- [ ] todo");

        assert!(html.contains(r#"type="checkbox""#));
        assert!(html.contains("checked"));
    }

    #[test]
    fn test_raw_html_passthrough() {
        let html = render("<div class=\"note\">hi</div>\n\ntext <b>bold</b>");

        assert!(html.contains("<div class=\"note\">hi</div>"));
        assert!(html.contains("<b>bold</b>"));
    }

    #[test]
    fn test_raw_html_escaped() {
        let renderer = HtmlRenderer::new().with_raw_html(false);
        let html = renderer.render_markdown("text <script>alert(1)</script>");

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_heading_ids_disabled() {
        let renderer = HtmlRenderer::new().with_heading_ids(false);

        assert_eq!(renderer.render_markdown("# Hi"), "<h1>Hi</h1>\n");
    }

    #[test]
    fn test_invalid_utf8() {
        let err = HtmlRenderer::new()
            .render(&[b'#', b' ', 0xff, 0xfe])
            .unwrap_err();

        assert!(matches!(err, RenderError::InvalidUtf8(_)));
    }

    #[test]
    fn test_too_large() {
        let renderer = HtmlRenderer::new().with_max_source_bytes(4);

        let err = renderer.render(b"hello").unwrap_err();

        assert!(matches!(err, RenderError::TooLarge { size: 5, limit: 4 }));
        assert_eq!(err.to_string(), "source is 5 bytes, limit is 4");
        assert!(renderer.render(b"four").is_ok());
    }
}
