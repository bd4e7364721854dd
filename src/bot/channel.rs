//! Channel lifecycle handlers for game channels.
//!
//! A channel created by an admin under the gaming or team category becomes a
//! game: the bot bootstraps its permissions, creates the matching role, and
//! registers the pair. Deleting the channel unregisters the game. The role
//! is deliberately left in place on deletion; removing roles automatically
//! has been deemed too risky.

use serenity::all::{
    AutoArchiveDuration, ChannelType, Context, EditChannel, GuildChannel, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId,
};
use tracing::{error, info};

use crate::registry::{slug, title, TopicFlavor};

use super::AppState;

/// Handles the channel_create event for channels under the managed
/// categories: permission bootstrap, role creation, registration.
pub async fn handle_channel_create(app: &AppState, ctx: Context, channel: GuildChannel) {
    let flavor = match channel.kind {
        ChannelType::Text => TopicFlavor::Channel,
        ChannelType::Forum => TopicFlavor::Forum,
        _ => return,
    };

    let mut registry = app.registry.lock().await;
    let managed = [registry.gaming_category(), registry.team_category()];
    if !channel.parent_id.is_some_and(|parent| managed.contains(&parent)) {
        return;
    }

    // Threads under a game channel should outlive the default archive window.
    if let Err(e) = channel
        .id
        .edit(
            &ctx.http,
            EditChannel::new().default_auto_archive_duration(AutoArchiveDuration::OneWeek),
        )
        .await
    {
        error!("failed to set archive duration on {}: {e}", channel.name);
    }

    // @everyone must neither see the channel nor create threads in it;
    // access flows through the game role only.
    let everyone = RoleId::new(channel.guild_id.get());
    let deny = Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::CREATE_PUBLIC_THREADS
        | Permissions::CREATE_PRIVATE_THREADS;
    if let Err(e) = channel
        .id
        .create_permission(
            &ctx.http,
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny,
                kind: PermissionOverwriteType::Role(everyone),
            },
        )
        .await
    {
        error!("failed to lock down channel {}: {e}", channel.name);
        return;
    }

    let game_name = title(&slug(&channel.name));
    let role = match channel
        .guild_id
        .create_role(&ctx.http, serenity::all::EditRole::new().name(&game_name))
        .await
    {
        Ok(role) => role,
        Err(e) => {
            error!("failed to create role for game '{game_name}': {e}");
            return;
        }
    };

    if let Err(e) = channel
        .id
        .create_permission(
            &ctx.http,
            PermissionOverwrite {
                allow: Permissions::VIEW_CHANNEL,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(role.id),
            },
        )
        .await
    {
        error!("failed to grant {game_name} role access: {e}");
    }

    if let Err(e) = registry.add_game(&channel.name, role.id, channel.id, flavor, None) {
        error!("failed to register game '{}': {e}", channel.name);
        return;
    }

    let log_channel = registry.log_channel();
    drop(registry);

    info!("registered game channel '{}'", channel.name);
    if let Err(e) = log_channel
        .say(
            &ctx.http,
            format!("Registered channel: '{}'", game_name.to_uppercase()),
        )
        .await
    {
        error!("failed to log game registration: {e}");
    }
}

/// Handles the channel_delete event: unregisters the game and logs it.
pub async fn handle_channel_delete(app: &AppState, ctx: Context, channel: GuildChannel) {
    let mut registry = app.registry.lock().await;
    let managed = [registry.gaming_category(), registry.team_category()];
    if !channel.parent_id.is_some_and(|parent| managed.contains(&parent)) {
        return;
    }

    if let Err(e) = registry.delete_game(&channel.name) {
        error!("failed to unregister game '{}': {e}", channel.name);
        return;
    }

    let log_channel = registry.log_channel();
    drop(registry);

    let game_name = title(&slug(&channel.name));
    info!("unregistered game channel '{}'", channel.name);
    if let Err(e) = log_channel
        .say(
            &ctx.http,
            format!("Unregistered channel: '{}'", game_name.to_uppercase()),
        )
        .await
    {
        error!("failed to log game removal: {e}");
    }
}
