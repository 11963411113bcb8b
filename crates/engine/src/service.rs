// Operations that compose storage with the collaborator traits: comments
// with @mentions, and the attachment flow.

use chrono::Utc;

use crate::blob::BlobStore;
use crate::error::Result;
use crate::history::{self, EditOutcome};
use crate::notify::{notify_best_effort, Notifier};
use crate::render::Renderer;
use crate::search;
use crate::store::files::FileStore;
use crate::store::pages::PageStore;
use crate::store::users::UserStore;
use crate::store::TenantStore;
use folium_common::types::{Comment, FileRecord};

/// `@name` tokens in a comment, first appearance order, deduplicated.
pub fn mentioned_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if ch != '@' {
            continue;
        }
        // `@` must start a word.
        if index > 0 {
            let before = text[..index].chars().next_back();
            if before.is_some_and(|prev| prev.is_alphanumeric()) {
                continue;
            }
        }
        let mut name = String::new();
        while let Some(&(_, next)) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Append a comment and notify any `@name`-mentioned users.
///
/// The comment body goes through the renderer, but references it contains
/// are not added to the page's graph edges.
pub fn add_comment(
    store: &TenantStore,
    renderer: &dyn Renderer,
    notifier: &dyn Notifier,
    page_id: &str,
    author: &str,
    text: &str,
) -> Result<Comment> {
    let conn = store.connection();
    let page = PageStore::require(conn, page_id)?;
    let rendered = renderer.render(store, text, author)?;

    let comment =
        PageStore::add_comment(conn, page_id, author, text, &rendered.html, Utc::now())?;
    search::refresh_page(conn, page_id)?;

    let emails = UserStore::emails_for_names(conn, &mentioned_names(text))?;
    notify_best_effort(
        notifier,
        &emails,
        &format!("{author} commented on {}", page.title),
        text,
    );

    Ok(comment)
}

/// Store an attachment and append its marker to the page as a normal
/// recorded edit. The blob and its metadata survive even if the edit
/// loses a concurrent race; the marker can be re-added by hand.
#[allow(clippy::too_many_arguments)]
pub fn attach_file(
    store: &TenantStore,
    blobs: &dyn BlobStore,
    renderer: &dyn Renderer,
    page_id: &str,
    name: &str,
    mime_type: &str,
    bytes: &[u8],
    as_image: bool,
    author: &str,
) -> Result<(FileRecord, EditOutcome)> {
    let conn = store.connection();
    let page = PageStore::require(conn, page_id)?;

    let record =
        FileStore::insert(conn, name, mime_type, bytes.len() as i64, author, Utc::now())?;
    blobs.put(record.id, bytes)?;

    let marker = if as_image {
        format!("[image:{}]", record.id)
    } else {
        format!("[file:{}]", record.id)
    };
    let new_md = if page.md.is_empty() {
        marker
    } else {
        format!("{}\n\n{marker}", page.md)
    };

    let outcome =
        history::record_edit(store, renderer, page_id, page.current_version, &new_md, author)?;
    Ok((record, outcome))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::{add_comment, attach_file, mentioned_names};
    use crate::blob::FsBlobStore;
    use crate::error::Result;
    use crate::history::EditOutcome;
    use crate::notify::Notifier;
    use crate::render::MarkdownRenderer;
    use crate::store::pages::PageStore;
    use crate::store::users::UserStore;
    use crate::store::TenantStore;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Vec<String>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, recipients: &[String], _subject: &str, _body: &str) -> Result<()> {
            self.sent
                .lock()
                .expect("lock should not be poisoned")
                .push(recipients.to_vec());
            Ok(())
        }
    }

    fn open_store(dir: &TempDir) -> TenantStore {
        TenantStore::open(
            &dir.path().join("wiki.db"),
            "tenant-1",
            "TeamDocs",
            &dir.path().join("blobs"),
        )
        .expect("tenant store should open")
    }

    #[test]
    fn mention_parsing_requires_word_starts() {
        assert_eq!(mentioned_names("ping @alice and @bob_2"), vec!["alice", "bob_2"]);
        assert!(mentioned_names("mail a@example.com").is_empty());
        assert!(mentioned_names("no mentions, @ alone").is_empty());
        assert_eq!(mentioned_names("@alice twice @alice"), vec!["alice"]);
    }

    #[test]
    fn comments_notify_mentioned_users_only() {
        let dir = TempDir::new().expect("temp dir should create");
        let store = open_store(&dir);
        let conn = store.connection();

        UserStore::insert(conn, "alice", "alice@example.com", "", false)
            .expect("user should insert");
        let page = PageStore::create_stub(conn, "Home", "system").expect("stub should create");

        let notifier = RecordingNotifier::default();
        let comment = add_comment(
            &store,
            &MarkdownRenderer,
            &notifier,
            &page.id,
            "bob",
            "looks good @alice, also @ghost",
        )
        .expect("comment should append");

        assert_eq!(comment.author, "bob");
        let sent = notifier.sent.lock().expect("lock should not be poisoned");
        assert_eq!(sent.as_slice(), &[vec!["alice@example.com".to_string()]]);
    }

    #[test]
    fn attaching_a_file_records_an_edit_with_a_marker() {
        let dir = TempDir::new().expect("temp dir should create");
        let store = open_store(&dir);
        let page =
            PageStore::create_stub(store.connection(), "Home", "system").expect("stub should create");
        let blobs = FsBlobStore::for_tenant(&store);

        let (record, outcome) = attach_file(
            &store,
            &blobs,
            &MarkdownRenderer,
            &page.id,
            "report.pdf",
            "application/pdf",
            b"%PDF-1.4",
            false,
            "alice",
        )
        .expect("attachment should succeed");

        assert_eq!(outcome, EditOutcome::Recorded { version: 2 });
        let page = PageStore::require(store.connection(), &page.id).expect("page should exist");
        assert_eq!(page.md, format!("[file:{}]", record.id));
        assert!(page.html.contains("report.pdf"));
    }
}
