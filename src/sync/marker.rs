//! Registration markers and the silent-join edit protocol.
//!
//! Every registered thread carries a marker message posted by the bot at
//! thread creation. Adding a member to a thread with the regular API sends
//! a system message to the thread; deleting a mention message leaves ghost
//! unread indicators. Instead, the marker is edited to append a mention
//! (which enrolls the mentioned member without a notification) and then
//! immediately edited back to its original text.
//!
//! The two edits are not atomic on the wire. If the second edit is lost,
//! the marker is left with a trailing `[Adding ...]` tag; the protocol
//! detects that shape on the next pass and restores to the canonical text
//! instead of compounding the corruption. `/fix-markers` performs the same
//! restoration on demand.

use serenity::all::ChannelId;

use crate::platform::{Platform, PlatformError};
use crate::registry::{title, TopicFlavor};

const APPEND_OPEN: &str = " [Adding ";
const APPEND_CLOSE: &str = "...]";

/// The canonical marker text for a game, derived purely from its slug.
pub fn marker_text(game: &str) -> String {
    format!("Registered this thread with '{}'!", title(game).to_uppercase())
}

/// The transient mention-appended form of a marker.
fn appended(base: &str, mention: &str) -> String {
    format!("{base}{APPEND_OPEN}{mention}{APPEND_CLOSE}")
}

/// Strips a well-formed trailing `[Adding ...]` tag left by an interrupted
/// edit pair, returning the canonical base. Returns `None` when the content
/// is neither canonical nor canonical-plus-tag (manual edits are left alone).
pub fn restorable_base<'a>(content: &'a str, canonical: &str) -> Option<&'a str> {
    if content == canonical {
        return Some(&content[..canonical.len()]);
    }
    let rest = content.strip_prefix(canonical)?;
    if rest.starts_with(APPEND_OPEN) && rest.ends_with(APPEND_CLOSE) {
        Some(&content[..canonical.len()])
    } else {
        None
    }
}

/// Enrolls a member (or every member of a mentioned role) into a thread by
/// appending the mention to the thread's marker and restoring it.
///
/// Both edits are awaited in order. A failure of the first edit leaves the
/// marker untouched; a failure of the second leaves the transient tag
/// visible, to be repaired by the next pass or `/fix-markers`.
pub async fn silent_add(
    platform: &dyn Platform,
    thread: ChannelId,
    flavor: TopicFlavor,
    game: &str,
    mention: &str,
) -> Result<(), PlatformError> {
    let marker = platform
        .nth_message(thread, flavor.marker_position())
        .await?;

    // Auto-repair: base the edit pair on the canonical text when the marker
    // carries a leftover tag from an interrupted pair.
    let canonical = marker_text(game);
    let base = restorable_base(&marker.content, &canonical)
        .unwrap_or(&marker.content)
        .to_string();

    platform
        .edit_message(thread, marker.id, &appended(&base, mention))
        .await?;
    platform.edit_message(thread, marker.id, &base).await?;
    Ok(())
}

/// Rewrites a thread's marker to its canonical text, whatever its current
/// state. Deterministic and idempotent.
pub async fn repair_marker(
    platform: &dyn Platform,
    thread: ChannelId,
    flavor: TopicFlavor,
    game: &str,
) -> Result<bool, PlatformError> {
    let marker = platform
        .nth_message(thread, flavor.marker_position())
        .await?;
    let canonical = marker_text(game);
    if marker.content == canonical {
        return Ok(false);
    }
    platform.edit_message(thread, marker.id, &canonical).await?;
    Ok(true)
}
