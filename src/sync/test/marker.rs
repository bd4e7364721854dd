use serenity::all::ChannelId;

use crate::platform::mock::MockPlatform;
use crate::platform::user_mention;
use crate::registry::TopicFlavor;
use crate::sync::marker::{marker_text, repair_marker, restorable_base, silent_add};

use super::MEMBER;

const THREAD: ChannelId = ChannelId::new(301);

/// Tests the canonical marker text shape.
#[test]
fn marker_text_uppercases_the_title() {
    assert_eq!(
        marker_text("deep-rock"),
        "Registered this thread with 'DEEP ROCK'!"
    );
}

/// Tests tag detection on the three content shapes the marker can be in.
///
/// Canonical and canonical-plus-tag both restore to the canonical base;
/// anything else (a manually edited marker) is left alone.
#[test]
fn restorable_base_detects_interrupted_pairs() {
    let canonical = marker_text("valheim");

    assert_eq!(restorable_base(&canonical, &canonical), Some(&*canonical));

    let tagged = format!("{canonical} [Adding <@7>...]");
    assert_eq!(restorable_base(&tagged, &canonical), Some(&*canonical));

    let manual = format!("{canonical} edited by a moderator");
    assert_eq!(restorable_base(&manual, &canonical), None);
}

/// Tests the silent-join round trip.
///
/// The marker is edited to carry the mention and edited straight back, so
/// the end state is the canonical text and the edit log shows exactly the
/// append-then-restore pair.
#[tokio::test]
async fn silent_add_appends_then_restores() {
    let platform = MockPlatform::new();
    let canonical = marker_text("valheim");
    platform.seed_message(THREAD, platform.bot_user(), &canonical);

    silent_add(
        &platform,
        THREAD,
        TopicFlavor::Channel,
        "valheim",
        &user_mention(MEMBER),
    )
    .await
    .unwrap();

    assert_eq!(platform.message_content(THREAD, 0), canonical);
    assert_eq!(
        platform.edit_log(),
        vec![
            (THREAD, format!("{canonical} [Adding <@7>...]")),
            (THREAD, canonical),
        ]
    );
}

/// Tests that the forum flavor targets the second message.
///
/// Forum threads start with the author's opening post; the marker sits
/// behind it and the opening post must never be edited.
#[tokio::test]
async fn silent_add_skips_the_opening_post_in_forums() {
    let platform = MockPlatform::new();
    let author = serenity::all::UserId::new(42);
    platform.seed_message(THREAD, author, "opening post");
    let canonical = marker_text("valheim");
    platform.seed_message(THREAD, platform.bot_user(), &canonical);

    silent_add(
        &platform,
        THREAD,
        TopicFlavor::Forum,
        "valheim",
        &user_mention(MEMBER),
    )
    .await
    .unwrap();

    assert_eq!(platform.message_content(THREAD, 0), "opening post");
    assert_eq!(platform.message_content(THREAD, 1), canonical);
}

/// Tests auto-repair of a marker left tagged by an interrupted pair.
///
/// The next silent add must base its edits on the canonical text, not the
/// corrupted content, so corruption never compounds.
#[tokio::test]
async fn silent_add_repairs_a_leftover_tag() {
    let platform = MockPlatform::new();
    let canonical = marker_text("valheim");
    platform.seed_message(
        THREAD,
        platform.bot_user(),
        &format!("{canonical} [Adding <@999>...]"),
    );

    silent_add(
        &platform,
        THREAD,
        TopicFlavor::Channel,
        "valheim",
        &user_mention(MEMBER),
    )
    .await
    .unwrap();

    assert_eq!(platform.message_content(THREAD, 0), canonical);
}

/// Tests what an interrupted pair leaves behind.
///
/// When the restoring edit fails, the transient tag stays visible; the
/// protocol accepts this state because the next pass repairs it.
#[tokio::test]
async fn interrupted_pair_leaves_the_tag() {
    let platform = MockPlatform::new();
    let canonical = marker_text("valheim");
    platform.seed_message(THREAD, platform.bot_user(), &canonical);
    platform.fail_edits_after(THREAD, 1);

    let result = silent_add(
        &platform,
        THREAD,
        TopicFlavor::Channel,
        "valheim",
        &user_mention(MEMBER),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(
        platform.message_content(THREAD, 0),
        format!("{canonical} [Adding <@7>...]")
    );
}

/// Tests explicit marker repair.
///
/// A corrupted marker is rewritten and reported; a canonical one is left
/// untouched and not counted.
#[tokio::test]
async fn repair_marker_is_idempotent() {
    let platform = MockPlatform::new();
    let canonical = marker_text("valheim");
    platform.seed_message(
        THREAD,
        platform.bot_user(),
        &format!("{canonical} [Adding <@7>...]"),
    );

    let repaired = repair_marker(&platform, THREAD, TopicFlavor::Channel, "valheim")
        .await
        .unwrap();
    assert!(repaired);
    assert_eq!(platform.message_content(THREAD, 0), canonical);

    let repaired = repair_marker(&platform, THREAD, TopicFlavor::Channel, "valheim")
        .await
        .unwrap();
    assert!(!repaired);
}
