//! HTML post-processing of the parsed event stream.

use std::collections::HashMap;

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

use crate::util::slugify;

/// Give every heading without an explicit id a slug id derived from its text.
///
/// Repeated slugs get `-1`, `-2`, ... suffixes in document order, matching
/// GitHub's anchor scheme. Headings whose text yields an empty slug are left
/// without an id.
pub(crate) fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut seen: HashMap<String, usize> = HashMap::new();

    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }
        let base = slugify(&heading_text(&events[i + 1..]));
        if base.is_empty() {
            continue;
        }
        let slug = unique_slug(base, &mut seen);
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
    }
}

/// Plain text of a heading, given the events that follow its start tag.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

fn unique_slug(base: String, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(base.clone()).or_insert(0);
    let slug = if *count == 0 {
        base
    } else {
        format!("{base}-{count}")
    };
    *count += 1;
    slug
}

/// Turn raw HTML in the source into literal text.
pub(crate) fn escape_raw_html(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use pulldown_cmark::Parser;

    use super::*;

    fn ids(markdown: &str) -> Vec<Option<String>> {
        let mut events: Vec<Event<'_>> = Parser::new(markdown).collect();
        assign_heading_ids(&mut events);
        events
            .iter()
            .filter_map(|e| match e {
                Event::Start(Tag::Heading { id, .. }) => Some(id.as_ref().map(ToString::to_string)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_heading_ids_from_text() {
        assert_eq!(
            ids("# Hello World\n\n## `code` span"),
            vec![Some("hello-world".to_owned()), Some("code-span".to_owned())]
        );
    }

    #[test]
    fn test_duplicate_headings_get_suffixes() {
        assert_eq!(
            ids("# Notes\n## Notes\n### Notes"),
            vec![
                Some("notes".to_owned()),
                Some("notes-1".to_owned()),
                Some("notes-2".to_owned())
            ]
        );
    }

    #[test]
    fn test_symbol_only_heading_has_no_id() {
        assert_eq!(ids("# ???"), vec![None]);
    }
}
