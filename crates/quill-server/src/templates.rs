//! Built-in HTML templates for the list, view and edit pages.
//!
//! All interpolated text is escaped except the rendered page body, which the
//! renderer already produced as HTML.

use std::fmt::Write;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use quill_renderer::escape_html;
use quill_storage::Title;

/// Characters encoded when a title is placed in a URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// URL path for a title under `prefix` (e.g. `/view`), percent-encoded.
pub(crate) fn title_path(prefix: &str, title: &Title) -> String {
    format!("{prefix}/{}", utf8_percent_encode(title.as_str(), SEGMENT))
}

/// Render the page index.
pub(crate) fn render_list(titles: &[Title]) -> String {
    let mut html = String::with_capacity(1024);
    open_document(&mut html, "All pages");

    html.push_str("<h1>All pages</h1>\n");
    if titles.is_empty() {
        html.push_str("<p class=\"empty\">No pages yet.</p>\n");
    } else {
        html.push_str("<ul class=\"pages\">\n");
        for title in titles {
            let _ = writeln!(
                html,
                "<li><a href=\"{}\">{}</a></li>",
                title_path("/view", title),
                escape_html(title.as_str())
            );
        }
        html.push_str("</ul>\n");
    }

    close_document(&mut html);
    html
}

/// Render a page with its stored HTML embedded verbatim.
pub(crate) fn render_view(title: &Title, body: &str) -> String {
    let mut html = String::with_capacity(body.len() + 1024);
    open_document(&mut html, title.as_str());

    let _ = writeln!(html, "<h1>{}</h1>", escape_html(title.as_str()));
    let _ = writeln!(
        html,
        "<p class=\"actions\"><a href=\"{}\">Edit</a></p>",
        title_path("/edit", title)
    );
    html.push_str("<article class=\"page\">\n");
    html.push_str(body);
    html.push_str("\n</article>\n");

    close_document(&mut html);
    html
}

/// Render the edit form, pre-filled with `source`.
pub(crate) fn render_edit(title: &Title, source: &str) -> String {
    let mut html = String::with_capacity(source.len() + 1024);
    let heading = format!("Editing {title}");
    open_document(&mut html, &heading);

    let _ = writeln!(html, "<h1>{}</h1>", escape_html(&heading));
    let _ = writeln!(
        html,
        "<form action=\"{}\" method=\"POST\">",
        title_path("/save", title)
    );
    let _ = writeln!(
        html,
        "<textarea name=\"content\" rows=\"20\" cols=\"80\">\n{}</textarea>",
        escape_html(source)
    );
    html.push_str("<p><input type=\"submit\" value=\"Save\"></p>\n");
    html.push_str("</form>\n");

    close_document(&mut html);
    html
}

fn open_document(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(title));
    html.push_str("<link rel=\"stylesheet\" href=\"/public/css/style.css\">\n");
    html.push_str("</head>\n<body>\n");
    html.push_str("<nav><a href=\"/list\">All pages</a></nav>\n");
    html.push_str("<main>\n");
}

fn close_document(html: &mut String) {
    html.push_str("</main>\n</body>\n</html>\n");
}
