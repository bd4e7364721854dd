//! Thread lifecycle and hub-thread membership handlers.
//!
//! Two thread flavors matter here. A thread created under a registered game
//! channel gets a registration marker posted by the bot, which later serves
//! as the silent-join anchor. A thread created under the hub channel *is* a
//! game: the bot provisions a role and a forum for it and registers the
//! trio. Members joining or leaving a hub thread drive role and forum
//! access for that game.

use std::time::Duration;

use serenity::all::{
    ChannelType, Context, CreateChannel, EditRole, GuildChannel, GuildId, PartialGuildChannel,
    ThreadMembersUpdateEvent, UserId,
};
use tracing::{error, info, warn};

use crate::platform::discord::DiscordPlatform;
use crate::platform::Platform;
use crate::registry::{title, Topic, TopicFlavor, MISC_GAMES};
use crate::sync::marker::marker_text;

use super::AppState;

/// Delay before posting the marker, giving the platform time to surface the
/// author's automatic opening post in forum threads.
const MARKER_DELAY: Duration = Duration::from_secs(5);

/// Handles the thread_create event for both flavors.
pub async fn handle_thread_create(app: &AppState, ctx: Context, thread: GuildChannel) {
    let Some(parent) = thread.parent_id else {
        return;
    };

    let registry = app.registry.lock().await;
    let is_hub = registry.hub_channel() == Some(parent);
    let is_game_thread = registry.channel_ids().contains(&parent);
    drop(registry);

    if is_hub {
        provision_hub_game(app, &ctx, &thread).await;
    } else if is_game_thread {
        post_marker(app, &ctx, &thread, parent).await;
    }
}

/// A new hub thread means a new game: create its role and forum, register.
async fn provision_hub_game(app: &AppState, ctx: &Context, thread: &GuildChannel) {
    let game_name = title(&crate::registry::slug(&thread.name));
    let role = match thread
        .guild_id
        .create_role(&ctx.http, EditRole::new().name(&game_name))
        .await
    {
        Ok(role) => role,
        Err(e) => {
            error!("failed to create role for hub game '{game_name}': {e}");
            return;
        }
    };

    let mut registry = app.registry.lock().await;
    let gaming_category = registry.gaming_category();

    let forum = match thread
        .guild_id
        .create_channel(
            &ctx.http,
            CreateChannel::new(&thread.name)
                .kind(ChannelType::Forum)
                .category(gaming_category),
        )
        .await
    {
        Ok(forum) => forum,
        Err(e) => {
            error!("failed to create forum for hub game '{game_name}': {e}");
            return;
        }
    };

    if let Err(e) = registry.add_game(
        &thread.name,
        role.id,
        forum.id,
        TopicFlavor::Forum,
        Some(thread.id),
    ) {
        error!("failed to register hub game '{}': {e}", thread.name);
        return;
    }

    let log_channel = registry.log_channel();
    drop(registry);

    info!("registered hub game '{}'", thread.name);
    if let Err(e) = log_channel
        .say(&ctx.http, format!("Registered game: '{}'", thread.name))
        .await
    {
        error!("failed to log hub game registration: {e}");
    }
}

/// Posts the registration marker into a new game thread.
async fn post_marker(app: &AppState, ctx: &Context, thread: &GuildChannel, parent: serenity::all::ChannelId) {
    // Let the author's opening post land first so the marker sits at its
    // expected position.
    tokio::time::sleep(MARKER_DELAY).await;

    let registry = app.registry.lock().await;
    let game = match registry.game_of(parent.get()) {
        Ok(game) => game.to_string(),
        Err(e) => {
            warn!("thread created under unregistered channel {parent}: {e}");
            return;
        }
    };
    drop(registry);

    if let Err(e) = thread.id.say(&ctx.http, marker_text(&game)).await {
        error!("failed to post marker in thread '{}': {e}", thread.name);
    }
}

/// Handles the thread_delete event: hub threads unregister their game (and
/// delete its role); plain game threads are just logged.
pub async fn handle_thread_delete(app: &AppState, ctx: Context, thread: PartialGuildChannel) {
    let mut registry = app.registry.lock().await;

    if registry.hub_thread_ids().contains(&thread.id) {
        let game = match registry.game_of(thread.id.get()) {
            Ok(game) => game.to_string(),
            Err(e) => {
                error!("hub thread {} has no game: {e}", thread.id);
                return;
            }
        };
        let topic = match registry.topic(&game) {
            Ok(topic) => topic,
            Err(e) => {
                error!("failed to resolve hub game '{game}': {e}");
                return;
            }
        };

        if let Err(e) = thread.guild_id.delete_role(&ctx.http, topic.role).await {
            error!("failed to delete role for hub game '{game}': {e}");
        }
        if let Err(e) = registry.delete_game(&game) {
            error!("failed to unregister hub game '{game}': {e}");
            return;
        }

        let log_channel = registry.log_channel();
        drop(registry);

        info!("unregistered hub game '{game}'");
        if let Err(e) = log_channel
            .say(&ctx.http, format!("Unregistered game: '{game}'"))
            .await
        {
            error!("failed to log hub game removal: {e}");
        }
        return;
    }

    let parent = thread.parent_id;
    if registry.channel_ids().contains(&parent) {
        let game = registry.game_of(parent.get()).unwrap_or("?").to_string();
        let log_channel = registry.log_channel();
        drop(registry);

        if let Err(e) = log_channel
            .say(
                &ctx.http,
                format!("Unregistered a thread from '{}'", title(&game)),
            )
            .await
        {
            error!("failed to log thread removal: {e}");
        }
    }
}

/// Handles members joining or leaving a hub thread: joining grants the
/// game role and enrolls the member into the game's forum threads; leaving
/// reverses both (policy permitting). Miscellaneous games are exempt in
/// both directions so members keep their manual thread choices.
pub async fn handle_thread_members_update(
    app: &AppState,
    ctx: Context,
    event: ThreadMembersUpdateEvent,
) {
    let registry = app.registry.lock().await;
    if !registry.hub_thread_ids().contains(&event.id) {
        return;
    }
    let topic = match registry
        .game_of(event.id.get())
        .map(str::to_string)
        .and_then(|game| registry.topic(&game))
    {
        Ok(topic) => topic,
        Err(e) => {
            error!("failed to resolve hub thread {}: {e}", event.id);
            return;
        }
    };
    drop(registry);

    let bot_user = ctx.cache.current_user().id;
    let platform = DiscordPlatform::new(ctx.http.clone(), bot_user);

    for added in &event.added_members {
        hub_join(app, &platform, event.guild_id, added.user_id, &topic).await;
    }
    for removed in &event.removed_member_ids {
        hub_leave(app, &platform, event.guild_id, *removed, &topic).await;
    }
}

async fn hub_join(
    _app: &AppState,
    platform: &dyn Platform,
    guild: GuildId,
    user: UserId,
    topic: &Topic,
) {
    if let Err(e) = platform.add_role(guild, user, topic.role).await {
        error!("failed to grant '{}' role to {user}: {e}", topic.name);
        return;
    }

    if topic.name == MISC_GAMES {
        return;
    }

    match platform.threads_of(guild, topic.channel).await {
        Ok(mut threads) => {
            threads.reverse();
            for thread in threads {
                if let Err(e) = platform.add_thread_member(thread, user).await {
                    warn!("failed to add {user} to thread {thread}: {e}");
                }
            }
        }
        Err(e) => warn!("failed to enumerate threads of '{}': {e}", topic.name),
    }
}

async fn hub_leave(
    app: &AppState,
    platform: &dyn Platform,
    guild: GuildId,
    user: UserId,
    topic: &Topic,
) {
    if app.config.retract_on_role_removal && topic.name != MISC_GAMES {
        match platform.threads_of(guild, topic.channel).await {
            Ok(mut threads) => {
                threads.reverse();
                for thread in threads {
                    if let Err(e) = platform.remove_thread_member(thread, user).await {
                        warn!("failed to remove {user} from thread {thread}: {e}");
                    }
                }
            }
            Err(e) => warn!("failed to enumerate threads of '{}': {e}", topic.name),
        }
    }

    if let Err(e) = platform.remove_role(guild, user, topic.role).await {
        error!("failed to revoke '{}' role from {user}: {e}", topic.name);
    }
}
