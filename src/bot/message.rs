//! Modify-room housekeeping.
//!
//! The modify-room channel exists for slash commands with ephemeral
//! responses; any regular message posted there is clutter. Shortly after a
//! message arrives, everything except the pinned commands message is
//! removed.

use std::time::Duration;

use serenity::all::{ChannelId, Context, Message, MessageId};
use tracing::{debug, warn};

use crate::platform::discord::DiscordPlatform;
use crate::platform::{Platform, PlatformError};

use super::AppState;

/// Delay before purging so ghost messages don't linger on the sender's
/// client.
const PURGE_DELAY: Duration = Duration::from_secs(2);

/// Deepest backlog one purge pass clears.
const PURGE_WINDOW: usize = 999;

/// Handles messages posted in the modify-room channel.
pub async fn handle_message(app: &AppState, ctx: Context, message: Message) {
    let registry = app.registry.lock().await;
    let modify_room = registry.modify_room_channel();
    let commands_msg = registry.modify_room_commands_msg();
    drop(registry);

    if message.channel_id != modify_room || message.id == commands_msg {
        return;
    }

    tokio::time::sleep(PURGE_DELAY).await;

    let bot_user = ctx.cache.current_user().id;
    let platform = DiscordPlatform::new(ctx.http.clone(), bot_user);
    match purge_except(&platform, modify_room, commands_msg).await {
        Ok(purged) => debug!("purged {purged} message(s) from modify-room"),
        Err(e) => warn!("failed to fetch modify-room history: {e}"),
    }
}

/// Deletes every message in the channel except `keep`, up to
/// [`PURGE_WINDOW`] deep, and returns the number deleted. Individual
/// deletion failures are logged and skipped.
pub async fn purge_except(
    platform: &dyn Platform,
    channel: ChannelId,
    keep: MessageId,
) -> Result<usize, PlatformError> {
    let mut purged = 0;
    for msg in platform.last_messages(channel, PURGE_WINDOW).await? {
        if msg.id == keep {
            continue;
        }
        match platform.delete_message(channel, msg.id).await {
            Ok(()) => purged += 1,
            Err(e) => warn!("failed to purge message {} from modify-room: {e}", msg.id),
        }
    }
    Ok(purged)
}
