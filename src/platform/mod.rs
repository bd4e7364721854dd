//! Abstract chat-platform capability surface.
//!
//! The core subsystems (membership synchronization, ticketing) never talk to
//! Discord directly; they go through the [`Platform`] trait, which exposes
//! exactly the operations they need: role membership queries, thread
//! enumeration, message history by position, message edits, thread member
//! management, and ticket channel lifecycle. The production implementation
//! ([`discord::DiscordPlatform`]) forwards to Serenity's HTTP client; tests
//! use an in-memory double.

pub mod discord;
#[cfg(test)]
pub mod mock;

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::async_trait;
use thiserror::Error;

/// Remote platform call failure.
///
/// Any variant is potentially transient (rate limit, permission change,
/// entity deleted mid-operation). Batch operations log these and continue
/// with the next item; single-shot commands report them to the invoker.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Discord API error from Serenity. Boxed due to large size.
    #[error(transparent)]
    Discord(#[from] Box<serenity::Error>),

    /// A referenced entity no longer exists on the platform.
    #[error("stale reference: {0}")]
    Stale(String),

    /// Catch-all for failures injected by test doubles.
    #[error("{0}")]
    Other(String),
}

impl From<serenity::Error> for PlatformError {
    fn from(err: serenity::Error) -> Self {
        PlatformError::Discord(Box::new(err))
    }
}

/// A message as seen through the platform surface.
#[derive(Debug, Clone)]
pub struct PlatformMessage {
    pub id: MessageId,
    pub author: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A channel as seen through the platform surface.
#[derive(Debug, Clone)]
pub struct PlatformChannel {
    pub id: ChannelId,
    pub name: String,
}

/// The operations the core needs from the hosting chat platform.
///
/// Thread lists are returned in platform-native order (newest first);
/// callers that need creation order must reverse. Message positions are
/// 1-based from the oldest message.
#[async_trait]
pub trait Platform: Send + Sync {
    /// The bot's own user id, for authorship checks.
    fn current_user_id(&self) -> UserId;

    // Roles

    async fn role_members(
        &self,
        guild: GuildId,
        role: RoleId,
    ) -> Result<Vec<UserId>, PlatformError>;

    async fn add_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError>;

    async fn remove_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError>;

    async fn create_role(&self, guild: GuildId, name: &str) -> Result<RoleId, PlatformError>;

    async fn delete_role(&self, guild: GuildId, role: RoleId) -> Result<(), PlatformError>;

    // Threads and messages

    /// All active threads under a parent channel/forum, newest first.
    async fn threads_of(
        &self,
        guild: GuildId,
        parent: ChannelId,
    ) -> Result<Vec<ChannelId>, PlatformError>;

    /// The nth message of a channel or thread, counting from the oldest
    /// (n = 1 is the first message ever sent).
    async fn nth_message(
        &self,
        channel: ChannelId,
        n: usize,
    ) -> Result<PlatformMessage, PlatformError>;

    /// The most recent messages of a channel, newest first.
    async fn last_messages(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<PlatformMessage>, PlatformError>;

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &str,
    ) -> Result<(), PlatformError>;

    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError>;

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError>;

    async fn add_thread_member(
        &self,
        thread: ChannelId,
        user: UserId,
    ) -> Result<(), PlatformError>;

    async fn remove_thread_member(
        &self,
        thread: ChannelId,
        user: UserId,
    ) -> Result<(), PlatformError>;

    /// Resets a thread's auto-archive countdown by setting the duration.
    async fn set_auto_archive(
        &self,
        thread: ChannelId,
        minutes: u16,
    ) -> Result<(), PlatformError>;

    // Channels

    /// Channels directly under a category.
    async fn category_channels(
        &self,
        guild: GuildId,
        category: ChannelId,
    ) -> Result<Vec<PlatformChannel>, PlatformError>;

    /// Users with an explicit view grant on a channel.
    async fn channel_viewers(&self, channel: ChannelId) -> Result<Vec<UserId>, PlatformError>;

    /// Creates a text channel under a category, visible to `viewer` only
    /// (on top of the category's defaults).
    async fn create_ticket_channel(
        &self,
        guild: GuildId,
        name: &str,
        category: ChannelId,
        viewer: UserId,
    ) -> Result<ChannelId, PlatformError>;

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError>;

    /// Replaces a channel's permission overwrites with its category's,
    /// revoking any per-user grants.
    async fn sync_channel_permissions(
        &self,
        channel: ChannelId,
        category: ChannelId,
    ) -> Result<(), PlatformError>;

    /// Posts an embed to a channel.
    async fn send_embed(
        &self,
        channel: ChannelId,
        title: &str,
        body: &str,
        colour: Option<u32>,
    ) -> Result<MessageId, PlatformError>;

    /// Posts the persistent "close ticket" control to a channel.
    async fn send_close_control(&self, channel: ChannelId) -> Result<MessageId, PlatformError>;
}

/// Formats a user mention the way the platform renders it.
pub fn user_mention(user: UserId) -> String {
    format!("<@{user}>")
}

/// Formats a role mention the way the platform renders it.
pub fn role_mention(role: RoleId) -> String {
    format!("<@&{role}>")
}
