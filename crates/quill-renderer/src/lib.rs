//! Markdown renderer for Quill pages.
//!
//! Converts page source (GitHub-flavoured markdown) into an HTML fragment that
//! the server embeds verbatim. Rendering is pure and deterministic, and
//! fails only for content that cannot be treated as markdown text.
//!
//! # Example
//!
//! ```
//! use quill_renderer::HtmlRenderer;
//!
//! let renderer = HtmlRenderer::new().with_raw_html(false);
//! let html = renderer.render(b"**Bold** <i>raw</i>").unwrap();
//! assert!(String::from_utf8(html).unwrap().contains("&lt;i&gt;"));
//! ```

mod html;
mod renderer;
mod util;

pub use renderer::{DEFAULT_MAX_SOURCE_BYTES, HtmlRenderer, RenderError};
pub use util::{escape_html, slugify};
