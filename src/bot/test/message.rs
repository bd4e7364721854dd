use serenity::all::{ChannelId, UserId};

use crate::bot::message::purge_except;
use crate::platform::mock::MockPlatform;
use crate::platform::Platform;

const MODIFY_ROOM: ChannelId = ChannelId::new(103);
const POSTER: UserId = UserId::new(7);

/// Tests the modify-room purge.
///
/// Everything except the pinned commands message is deleted, and the
/// commands message survives regardless of its position in the history.
#[tokio::test]
async fn purge_keeps_only_the_commands_message() {
    let platform = MockPlatform::new();
    let keep = platform.seed_message(MODIFY_ROOM, platform.bot_user(), "commands");
    platform.seed_message(MODIFY_ROOM, POSTER, "hello?");
    platform.seed_message(MODIFY_ROOM, POSTER, "anyone here");

    let purged = purge_except(&platform, MODIFY_ROOM, keep).await.unwrap();

    assert_eq!(purged, 2);
    let remaining = platform.last_messages(MODIFY_ROOM, 10).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
}

/// Tests that one pass clears a backlog deeper than a single history page.
///
/// The purge window must span several pages of history, so a channel that
/// accumulated hundreds of messages comes clean on the next event.
#[tokio::test]
async fn purge_clears_a_deep_backlog_in_one_pass() {
    let platform = MockPlatform::new();
    let keep = platform.seed_message(MODIFY_ROOM, platform.bot_user(), "commands");
    for i in 0..250 {
        platform.seed_message(MODIFY_ROOM, POSTER, &format!("message {i}"));
    }

    let purged = purge_except(&platform, MODIFY_ROOM, keep).await.unwrap();

    assert_eq!(purged, 250);
    let remaining = platform.last_messages(MODIFY_ROOM, 300).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
}
