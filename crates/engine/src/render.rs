// Markdown rendering: wiki links and file markers become HTML, headings
// get anchors, and a table of contents is derived from the heading tree.
//
// Rendering is behind a trait so the edit path can be driven with a stub
// renderer in tests.

use std::collections::HashMap;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::error::Result;
use crate::store::files::FileStore;
use crate::store::pages::PageStore;
use crate::store::TenantStore;
use folium_common::link::{parse_file_markers, parse_page_links, FileMarkerKind};

/// A rendered page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub toc: String,
    /// Titles of referenced pages, in order of first appearance in the
    /// source. Every title resolves to an existing page after rendering.
    pub refs: Vec<String>,
}

pub trait Renderer {
    fn render(&self, store: &TenantStore, source: &str, author: &str) -> Result<Rendered>;
}

/// The literal anchor form a `[[Title]]` link renders to. The rename
/// cascade substitutes this form in stored HTML, so it must stay in sync
/// with what `MarkdownRenderer` emits.
pub fn page_link_html(slug: &str, page_id: &str, title: &str) -> String {
    format!("<a href=\"/{slug}/page/{page_id}\">{}</a>", escape_html(title))
}

fn file_link_html(slug: &str, file_id: i64, name: &str) -> String {
    format!("<a href=\"/{slug}/file/{file_id}\">{}</a>", escape_html(name))
}

fn image_html(slug: &str, file_id: i64, name: &str, width: u32, height: u32) -> String {
    let mut tag = format!("<img src=\"/{slug}/file/{file_id}\" alt=\"{}\"", escape_html(name));
    if width > 0 && height > 0 {
        tag.push_str(&format!(" width=\"{width}\" height=\"{height}\""));
    }
    tag.push_str(" />");
    tag
}

#[derive(Debug, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, store: &TenantStore, source: &str, author: &str) -> Result<Rendered> {
        let (substituted, refs) = self.substitute_links(store, source, author)?;

        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut events: Vec<Event<'_>> = Parser::new_ext(&substituted, options).collect();
        let toc = anchor_headings(&mut events);

        let mut body = String::new();
        html::push_html(&mut body, events.into_iter());

        Ok(Rendered { html: body, toc, refs })
    }
}

impl MarkdownRenderer {
    /// Replace `[[Title]]` links and file markers with inline HTML,
    /// creating stub pages for titles that do not resolve yet.
    fn substitute_links(
        &self,
        store: &TenantStore,
        source: &str,
        author: &str,
    ) -> Result<(String, Vec<String>)> {
        enum Span {
            Page { start: usize, end: usize, title: String },
            File { start: usize, end: usize, kind: FileMarkerKind, id: i64, w: u32, h: u32 },
        }

        let mut spans: Vec<Span> = parse_page_links(source)
            .into_iter()
            .map(|link| Span::Page {
                start: link.start_offset,
                end: link.end_offset,
                title: link.title,
            })
            .collect();
        spans.extend(parse_file_markers(source).into_iter().map(|marker| Span::File {
            start: marker.start_offset,
            end: marker.end_offset,
            kind: marker.kind,
            id: marker.file_id,
            w: marker.width,
            h: marker.height,
        }));
        spans.sort_by_key(|span| match span {
            Span::Page { start, .. } | Span::File { start, .. } => *start,
        });

        let conn = store.connection();
        let mut out = String::with_capacity(source.len());
        let mut refs: Vec<String> = Vec::new();
        let mut cursor = 0usize;

        for span in spans {
            match span {
                Span::Page { start, end, title } => {
                    out.push_str(&source[cursor..start]);
                    let page = match PageStore::get_by_title(conn, &title)? {
                        Some(page) => page,
                        None => PageStore::create_stub(conn, &title, author)?,
                    };
                    out.push_str(&page_link_html(store.slug(), &page.id, &title));
                    if !refs.contains(&title) {
                        refs.push(title);
                    }
                    cursor = end;
                }
                Span::File { start, end, kind, id, w, h } => {
                    out.push_str(&source[cursor..start]);
                    match FileStore::get(conn, id)? {
                        Some(record) => {
                            let rendered = match kind {
                                FileMarkerKind::File => {
                                    file_link_html(store.slug(), id, &record.name)
                                }
                                FileMarkerKind::Image => {
                                    image_html(store.slug(), id, &record.name, w, h)
                                }
                            };
                            out.push_str(&rendered);
                        }
                        // Dangling marker, keep the literal text visible.
                        None => out.push_str(&source[start..end]),
                    }
                    cursor = end;
                }
            }
        }
        out.push_str(&source[cursor..]);

        Ok((out, refs))
    }
}

/// Assign an anchor id to every heading and return the table of contents
/// as a flat HTML list.
fn anchor_headings(events: &mut [Event<'_>]) -> String {
    let mut toc = String::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut index = 0usize;

    while index < events.len() {
        let Event::Start(Tag::Heading { level, .. }) = &events[index] else {
            index += 1;
            continue;
        };
        let depth = *level as usize;

        let mut text = String::new();
        let mut end = index + 1;
        while end < events.len() {
            match &events[end] {
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                Event::End(TagEnd::Heading(_)) => break,
                _ => {}
            }
            end += 1;
        }

        let mut anchor = slugify(&text);
        let count = seen.entry(anchor.clone()).or_insert(0);
        if *count > 0 {
            anchor = format!("{anchor}-{count}");
        }
        *count += 1;

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[index] {
            *id = Some(CowStr::from(anchor.clone()));
        }
        toc.push_str(&format!(
            "<li class=\"toc-l{depth}\"><a href=\"#{anchor}\">{}</a></li>",
            escape_html(&text)
        ));

        index = end + 1;
    }

    if toc.is_empty() {
        String::new()
    } else {
        format!("<ul class=\"toc\">{toc}</ul>")
    }
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("section");
    }
    slug
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
