//! Recognition of scripts and thumbnails among the ordinary chat messages

use crate::pipeline::Content;
use crate::prelude::*;
use crate::tg::{self, wizard};
use crate::util::DynResult;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{MediaKind, MessageKind};

/// Shorter texts are treated as a regular chat
const MIN_SCRIPT_CHARS: usize = 50;

/// Telegram delivers every photo of an album as a separate message,
/// so they are collected for this long before starting the selection
const ALBUM_DEBOUNCE: Duration = Duration::from_millis(1500);

const BULK_SEPARATOR: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Detected {
    Content(wizard::Payload),

    /// Photo that is part of an album identified by the media group id
    AlbumItem { group: String, content: Content },
}

/// Splits by separator lines. Returns `None` unless there are at least
/// two parts and every one of them is long enough to be a script on its
/// own, so a single script with a horizontal rule stays whole.
fn split_bulk(text: &str) -> Option<Vec<String>> {
    let mut parts = vec![];
    let mut current = vec![];

    for line in text.lines() {
        if line.trim() == BULK_SEPARATOR {
            parts.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    parts.push(current.join("\n"));

    let parts: Vec<_> = parts
        .into_iter()
        .map(|part| part.trim().to_owned())
        .filter(|part| !part.is_empty())
        .collect();

    let all_scripts = parts.iter().all(|part| is_script_length(part));

    (parts.len() >= 2 && all_scripts).then_some(parts)
}

fn is_script_length(text: &str) -> bool {
    text.chars().count() > MIN_SCRIPT_CHARS
}

pub(crate) fn detect_text(text: &str) -> Option<wizard::Payload> {
    if text.starts_with('/') || !is_script_length(text) {
        return None;
    }

    if let Some(parts) = split_bulk(text) {
        let items = parts
            .into_iter()
            .map(|text| Content::Script { text })
            .collect();
        return Some(wizard::Payload::Bulk(items));
    }

    Some(wizard::Payload::Single(Content::Script {
        text: text.to_owned(),
    }))
}

fn thumbnail(file_id: &str) -> Content {
    Content::Thumbnail {
        file_id: file_id.to_owned(),
        url: None,
    }
}

/// Filter for the dispatcher that lets through only the messages with
/// content that may be assigned to a slot.
pub(crate) fn filter(msg: Message) -> Option<Detected> {
    msg.from.as_ref()?;

    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };

    match &common.media_kind {
        MediaKind::Text(text) => detect_text(&text.text).map(Detected::Content),
        MediaKind::Photo(photo) => {
            // Sizes are ordered from the smallest to the largest one
            let content = thumbnail(&photo.photo.last()?.file.id);

            Some(match &photo.media_group_id {
                Some(group) => Detected::AlbumItem {
                    group: group.clone(),
                    content,
                },
                None => Detected::Content(wizard::Payload::Single(content)),
            })
        }
        MediaKind::Document(doc) => {
            let is_image = doc
                .document
                .mime_type
                .as_ref()
                .is_some_and(|mime| mime.type_() == "image");

            is_image.then(|| {
                Detected::Content(wizard::Payload::Single(thumbnail(&doc.document.file.id)))
            })
        }
        _ => None,
    }
}

struct PendingAlbum {
    user: UserId,
    first_msg: Message,
    items: Vec<Content>,
}

#[derive(Default)]
pub(crate) struct AlbumBuffer {
    pending: SyncMutex<HashMap<String, PendingAlbum>>,
}

impl AlbumBuffer {
    /// Returns `true` if this is the first item of the album
    fn push(&self, group: String, user: UserId, msg: &Message, content: Content) -> bool {
        let mut pending = self.pending.lock();

        if let Some(album) = pending.get_mut(&group) {
            album.items.push(content);
            return false;
        }

        pending.insert(
            group,
            PendingAlbum {
                user,
                first_msg: msg.clone(),
                items: vec![content],
            },
        );

        true
    }

    fn take(&self, group: &str) -> Option<PendingAlbum> {
        self.pending.lock().remove(group)
    }
}

#[instrument(skip_all, fields(
    chat = %msg.chat.debug_id(),
    sender = msg.from.as_ref().map(|user| user.debug_id()).as_deref(),
))]
pub(crate) async fn handle(ctx: Arc<tg::Ctx>, msg: Message, detected: Detected) -> DynResult {
    // The filter doesn't let through messages without a sender
    let Some(user) = msg.from.as_ref().map(|user| user.id) else {
        return Ok(());
    };

    match detected {
        Detected::Content(payload) => {
            wizard::start_or_report(&ctx, &msg, user, payload).await;
        }
        Detected::AlbumItem { group, content } => {
            if !ctx.albums.push(group.clone(), user, &msg, content) {
                return Ok(());
            }

            debug!(%group, "Collecting album items");

            tokio::spawn(
                async move {
                    tokio::time::sleep(ALBUM_DEBOUNCE).await;
                    finish_album(&ctx, &group).await;
                }
                .in_current_span(),
            );
        }
    }

    Ok(())
}

async fn finish_album(ctx: &tg::Ctx, group: &str) {
    let Some(album) = ctx.albums.take(group) else {
        return;
    };

    let PendingAlbum {
        user,
        first_msg,
        mut items,
    } = album;

    info!(group, items = items.len(), "Album is complete");

    let payload = if items.len() == 1 {
        wizard::Payload::Single(items.remove(0))
    } else {
        wizard::Payload::Bulk(items)
    };

    wizard::start_or_report(ctx, &first_msg, user, payload).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn long_text(prefix: &str) -> String {
        format!("{prefix} {}", "lorem ipsum ".repeat(5))
    }

    #[test]
    fn short_texts_and_commands_are_not_scripts() {
        assert_eq!(detect_text("hello"), None);
        assert_eq!(detect_text(&"x".repeat(MIN_SCRIPT_CHARS)), None);
        assert_eq!(detect_text(&format!("/start {}", long_text("a"))), None);
    }

    #[test]
    fn long_text_is_a_single_script() {
        let text = long_text("Intro");
        assert_eq!(
            detect_text(&text),
            Some(wizard::Payload::Single(Content::Script { text }))
        );
    }

    #[test]
    fn separator_lines_split_scripts() {
        let first = long_text("First");
        let second = long_text("Second\nwith two lines");
        let text = format!("{first}\n---\n\n{second}\n---\n---\n");

        assert_matches!(
            detect_text(&text),
            Some(wizard::Payload::Bulk(items)) if items == [
                Content::Script { text: first.trim().to_owned() },
                Content::Script { text: second.trim().to_owned() },
            ]
        );

        // Dashes inside of a line are not separators
        assert_eq!(split_bulk(&format!("{first} --- {second}")), None);
    }

    #[test]
    fn short_text_with_separators_is_ignored() {
        assert_eq!(detect_text("hi\n---\nok"), None);
        assert_eq!(detect_text("short\n---\n"), None);
    }

    #[test]
    fn horizontal_rule_keeps_the_script_whole() {
        let text = format!(
            "{}\n---\nThat's all for today, subscribe!",
            long_text("Chapter one")
        );

        assert_eq!(
            detect_text(&text),
            Some(wizard::Payload::Single(Content::Script { text }))
        );
    }
}
