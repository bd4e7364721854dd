//! Member update handler: the entry point of the membership synchronizer.

use serenity::all::{Context, GuildMemberUpdateEvent, Member};
use tracing::debug;

use crate::platform::discord::DiscordPlatform;
use crate::sync::MembershipSynchronizer;

use super::AppState;

/// Handles the guild_member_update event when a member's roles change.
///
/// Requires the cached before-state to compute the delta; without it there
/// is nothing safe to do, and the next `/sync` will reconcile.
pub async fn handle_guild_member_update(
    app: &AppState,
    ctx: Context,
    old: Option<Member>,
    new: Option<Member>,
    _event: GuildMemberUpdateEvent,
) {
    let Some(member) = new else {
        return;
    };
    let Some(old) = old else {
        debug!(
            "no cached before-state for {}, skipping membership sync",
            member.user.id
        );
        return;
    };

    if old.roles == member.roles {
        return;
    }

    let bot_user = ctx.cache.current_user().id;
    let platform = DiscordPlatform::new(ctx.http.clone(), bot_user);

    // The registry lock is held across the whole pass, serializing this
    // event against registry mutations and other membership passes.
    let registry = app.registry.lock().await;
    let synchronizer = MembershipSynchronizer::new(
        &platform,
        &registry,
        &app.gate,
        app.config.retract_on_role_removal,
    );
    synchronizer
        .apply_role_change(member.guild_id, member.user.id, &old.roles, &member.roles)
        .await;
}
