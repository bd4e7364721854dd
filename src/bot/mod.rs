//! Discord event handling.
//!
//! The [`Handler`] owns the shared application state and delegates every
//! gateway event to a free function in a per-event module, mirroring the
//! separation between dispatch and behaviour. Handlers log failures and
//! return; a broken event must never take down the gateway connection.
//!
//! # Gateway Intents
//!
//! - `GUILDS` - channel and thread lifecycle events
//! - `GUILD_MEMBERS` - role-set changes on members (privileged intent)
//! - `GUILD_MESSAGES` + `MESSAGE_CONTENT` - modify-room housekeeping and
//!   marker message access

pub mod channel;
pub mod commands;
pub mod interaction;
pub mod member;
pub mod message;
pub mod ready;
#[cfg(test)]
mod test;
pub mod thread;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serenity::all::{
    Context, EventHandler, GuildChannel, GuildId, GuildMemberUpdateEvent, Interaction, Member,
    Message, PartialGuildChannel, Ready, ThreadMembersUpdateEvent, User,
};
use serenity::async_trait;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::registry::GameRegistry;
use crate::sync::gate::SyncGate;
use crate::ticket::TicketLedger;

/// Shared application state, constructed once at startup and handed to
/// every component by reference.
pub struct AppState {
    pub config: Config,
    pub registry: Mutex<GameRegistry>,
    pub ledger: Mutex<TicketLedger>,
    pub gate: Arc<SyncGate>,
    /// Set by the first ready event so reconnects don't spawn a second
    /// keep-alive scheduler.
    pub scheduler_started: AtomicBool,
}

/// Discord bot event handler
pub struct Handler {
    pub app: Arc<AppState>,
}

impl Handler {
    pub fn new(app: Arc<AppState>) -> Self {
        Self { app }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord
    async fn ready(&self, ctx: Context, ready: Ready) {
        ready::handle_ready(&self.app, ctx, ready).await;
    }

    /// Called when a channel is created in a guild
    async fn channel_create(&self, ctx: Context, channel: GuildChannel) {
        channel::handle_channel_create(&self.app, ctx, channel).await;
    }

    /// Called when a channel is deleted from a guild
    async fn channel_delete(
        &self,
        ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        channel::handle_channel_delete(&self.app, ctx, channel).await;
    }

    /// Called when a thread is created in a guild
    async fn thread_create(&self, ctx: Context, thread: GuildChannel) {
        thread::handle_thread_create(&self.app, ctx, thread).await;
    }

    /// Called when a thread is deleted from a guild
    async fn thread_delete(
        &self,
        ctx: Context,
        thread: PartialGuildChannel,
        _full_thread_data: Option<GuildChannel>,
    ) {
        thread::handle_thread_delete(&self.app, ctx, thread).await;
    }

    /// Called when members join or leave a thread
    async fn thread_members_update(&self, ctx: Context, event: ThreadMembersUpdateEvent) {
        thread::handle_thread_members_update(&self.app, ctx, event).await;
    }

    /// Called when a member is updated in a guild (roles, nickname, etc.)
    async fn guild_member_update(
        &self,
        ctx: Context,
        old: Option<Member>,
        new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        member::handle_guild_member_update(&self.app, ctx, old, new, event).await;
    }

    /// Called when a member leaves a guild
    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        tracing::debug!("member {} left guild {guild_id}", user.id);
    }

    /// Called when a message is sent in a channel
    async fn message(&self, ctx: Context, message: Message) {
        message::handle_message(&self.app, ctx, message).await;
    }

    /// Called when a slash command or component interaction is submitted
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        interaction::handle_interaction(&self.app, ctx, interaction).await;
    }
}
