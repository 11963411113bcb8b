// Wiki link (`[[Title]]`) and file marker (`[file:ID]`, `[image:ID@WxH]`)
// parsing over raw markdown.
//
// Parsing works on plain source text, so it is usable both by the renderer
// and by "what does this page reference" indexing without a render.

/// A parsed `[[Title]]` page link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Referenced page title, trimmed.
    pub title: String,
    /// Byte offset of the opening `[[`.
    pub start_offset: usize,
    /// Byte offset just after the closing `]]`.
    pub end_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMarkerKind {
    File,
    Image,
}

/// A parsed `[file:ID]` or `[image:ID@WxH]` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMarker {
    pub kind: FileMarkerKind,
    pub file_id: i64,
    /// Optional display size, images only. Zero means unspecified.
    pub width: u32,
    pub height: u32,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// The literal source-syntax form of a link to a page, used verbatim by
/// the rename cascade for in-place substitution.
pub fn page_link_source(title: &str) -> String {
    format!("[[{title}]]")
}

/// Parse `[[Title]]` page links from markdown.
pub fn parse_page_links(markdown: &str) -> Vec<PageLink> {
    let mut links = Vec::new();
    let bytes = markdown.as_bytes();
    let mut index = 0usize;

    while index + 1 < bytes.len() {
        if bytes[index] == b'[' && bytes[index + 1] == b'[' {
            let start = index;
            index += 2;

            let mut close = None;
            while index + 1 < bytes.len() {
                if bytes[index] == b']' && bytes[index + 1] == b']' {
                    close = Some(index);
                    break;
                }
                index += 1;
            }

            let Some(close_start) = close else {
                break;
            };

            let title = markdown[start + 2..close_start].trim();
            if !title.is_empty() {
                links.push(PageLink {
                    title: title.to_string(),
                    start_offset: start,
                    end_offset: close_start + 2,
                });
            }
            index = close_start + 2;
            continue;
        }

        index += 1;
    }

    links
}

/// Parse `[file:ID]` / `[image:ID@WxH]` markers from markdown.
pub fn parse_file_markers(markdown: &str) -> Vec<FileMarker> {
    let mut markers = Vec::new();
    let bytes = markdown.as_bytes();
    let mut index = 0usize;

    while index < bytes.len() {
        if bytes[index] != b'[' {
            index += 1;
            continue;
        }
        // `[[` opens a page link, never a file marker.
        if index + 1 < bytes.len() && bytes[index + 1] == b'[' {
            index += 2;
            continue;
        }

        let Some(close_rel) = markdown[index..].find(']') else {
            break;
        };
        let inner = &markdown[index + 1..index + close_rel];
        if let Some(marker) = parse_marker_inner(inner, index, index + close_rel + 1) {
            markers.push(marker);
        }
        index += close_rel + 1;
    }

    markers
}

fn parse_marker_inner(inner: &str, start_offset: usize, end_offset: usize) -> Option<FileMarker> {
    let (kind_text, rest) = inner.split_once(':')?;
    let kind = match kind_text {
        "file" => FileMarkerKind::File,
        "image" => FileMarkerKind::Image,
        _ => return None,
    };

    let (id_text, size_text) = match rest.split_once('@') {
        Some((id, size)) => (id, Some(size)),
        None => (rest, None),
    };

    let file_id: i64 = id_text.parse().ok()?;

    let (width, height) = match size_text {
        Some(size) => {
            let (w, h) = size.split_once('x')?;
            (w.parse().ok()?, h.parse().ok()?)
        }
        None => (0, 0),
    };

    Some(FileMarker { kind, file_id, width, height, start_offset, end_offset })
}

#[cfg(test)]
mod tests {
    use super::{page_link_source, parse_file_markers, parse_page_links, FileMarkerKind};

    #[test]
    fn parses_basic_page_link() {
        let links = parse_page_links("see [[Beta]].");

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "Beta");
        assert_eq!((links[0].start_offset, links[0].end_offset), (4, 12));
    }

    #[test]
    fn parses_multiple_links_and_trims_whitespace() {
        let links = parse_page_links("[[One]] then [[ Two Words ]]");

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "One");
        assert_eq!(links[1].title, "Two Words");
    }

    #[test]
    fn ignores_empty_and_unterminated_links() {
        assert!(parse_page_links("[[]] and [[open").is_empty());
    }

    #[test]
    fn link_offsets_slice_back_to_the_source() {
        let markdown = "A [[One]] B [[Two]]";
        let links = parse_page_links(markdown);

        assert_eq!(&markdown[links[0].start_offset..links[0].end_offset], "[[One]]");
        assert_eq!(&markdown[links[1].start_offset..links[1].end_offset], "[[Two]]");
    }

    #[test]
    fn source_form_matches_what_the_parser_accepts() {
        let form = page_link_source("Team Docs");
        assert_eq!(form, "[[Team Docs]]");

        let links = parse_page_links(&form);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "Team Docs");
    }

    #[test]
    fn parses_file_marker_without_size() {
        let markers = parse_file_markers("attachment: [file:12]");

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].kind, FileMarkerKind::File);
        assert_eq!(markers[0].file_id, 12);
        assert_eq!((markers[0].width, markers[0].height), (0, 0));
    }

    #[test]
    fn parses_image_marker_with_size() {
        let markers = parse_file_markers("[image:7@640x480]");

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].kind, FileMarkerKind::Image);
        assert_eq!(markers[0].file_id, 7);
        assert_eq!((markers[0].width, markers[0].height), (640, 480));
    }

    #[test]
    fn rejects_malformed_markers_and_page_links() {
        assert!(parse_file_markers("[file:abc] [video:1] [image:2@x] [[Beta]]").is_empty());
    }

    #[test]
    fn page_links_and_markers_coexist() {
        let markdown = "see [[Beta]] and [file:3]";
        assert_eq!(parse_page_links(markdown).len(), 1);
        assert_eq!(parse_file_markers(markdown).len(), 1);
    }
}
