//! Serenity-backed implementation of the [`Platform`] trait.
//!
//! A thin adapter over Serenity's HTTP client. No business logic lives here;
//! every method is a direct translation of one capability to the Discord
//! REST API. The cache is deliberately not used for message history or
//! member lists, since the synchronizer needs authoritative ordering.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::all::{
    AutoArchiveDuration, ButtonStyle, Channel, ChannelId, ChannelType, Colour, CreateActionRow,
    CreateButton, CreateChannel, CreateEmbed, CreateMessage, EditChannel, EditMessage, EditRole,
    EditThread, GetMessages, GuildId, Http, Message, MessageId, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId, UserId,
};
use serenity::async_trait;

use super::{Platform, PlatformChannel, PlatformError, PlatformMessage};
use crate::ticket::CLOSE_TICKET_ID;

/// Discord adapter over a shared HTTP client.
pub struct DiscordPlatform {
    http: Arc<Http>,
    bot_user: UserId,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>, bot_user: UserId) -> Self {
        Self { http, bot_user }
    }

    /// Fetches a guild channel, failing with a stale reference otherwise.
    async fn guild_channel(
        &self,
        channel: ChannelId,
    ) -> Result<serenity::all::GuildChannel, PlatformError> {
        match channel.to_channel(&self.http).await? {
            Channel::Guild(guild_channel) => Ok(guild_channel),
            _ => Err(PlatformError::Stale(format!(
                "channel {channel} is not a guild channel"
            ))),
        }
    }
}

fn to_platform_message(msg: &Message) -> PlatformMessage {
    PlatformMessage {
        id: msg.id,
        author: msg.author.id,
        content: msg.content.clone(),
        created_at: DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    }
}

/// Largest page the guild member list endpoint serves per request.
const MEMBER_PAGE: u64 = 1000;

/// Largest page the message history endpoint serves per request.
const MESSAGE_PAGE: usize = 100;

fn archive_duration(minutes: u16) -> AutoArchiveDuration {
    match minutes {
        60 => AutoArchiveDuration::OneHour,
        1440 => AutoArchiveDuration::OneDay,
        4320 => AutoArchiveDuration::ThreeDays,
        _ => AutoArchiveDuration::OneWeek,
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    fn current_user_id(&self) -> UserId {
        self.bot_user
    }

    async fn role_members(
        &self,
        guild: GuildId,
        role: RoleId,
    ) -> Result<Vec<UserId>, PlatformError> {
        // The member list endpoint returns at most one page per request;
        // follow the `after` cursor until a short page so large guilds are
        // never silently truncated.
        let mut members = Vec::new();
        let mut after: Option<UserId> = None;
        loop {
            let page = guild.members(&self.http, Some(MEMBER_PAGE), after).await?;
            let page_len = page.len() as u64;
            after = page.last().map(|m| m.user.id);
            members.extend(
                page.into_iter()
                    .filter(|m| m.roles.contains(&role))
                    .map(|m| m.user.id),
            );
            if page_len < MEMBER_PAGE {
                break;
            }
        }
        Ok(members)
    }

    async fn add_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        self.http
            .add_member_role(guild, user, role, None)
            .await
            .map_err(Into::into)
    }

    async fn remove_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        self.http
            .remove_member_role(guild, user, role, None)
            .await
            .map_err(Into::into)
    }

    async fn create_role(&self, guild: GuildId, name: &str) -> Result<RoleId, PlatformError> {
        let role = guild
            .create_role(&self.http, EditRole::new().name(name))
            .await?;
        Ok(role.id)
    }

    async fn delete_role(&self, guild: GuildId, role: RoleId) -> Result<(), PlatformError> {
        guild.delete_role(&self.http, role).await.map_err(Into::into)
    }

    async fn threads_of(
        &self,
        guild: GuildId,
        parent: ChannelId,
    ) -> Result<Vec<ChannelId>, PlatformError> {
        let threads = self.http.get_guild_active_threads(guild).await?;
        Ok(threads
            .threads
            .into_iter()
            .filter(|t| t.parent_id == Some(parent))
            .map(|t| t.id)
            .collect())
    }

    async fn nth_message(
        &self,
        channel: ChannelId,
        n: usize,
    ) -> Result<PlatformMessage, PlatformError> {
        // `after` with a floor id yields the oldest messages; sort by id to
        // be independent of the response ordering.
        let mut messages = channel
            .messages(
                &self.http,
                GetMessages::new().after(MessageId::new(1)).limit(n as u8),
            )
            .await?;
        messages.sort_by_key(|m| m.id);
        messages
            .get(n - 1)
            .map(to_platform_message)
            .ok_or_else(|| PlatformError::Stale(format!("channel {channel} has no message #{n}")))
    }

    async fn last_messages(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<PlatformMessage>, PlatformError> {
        // History pages are capped per request; follow the `before` cursor
        // (the oldest message seen so far) until the limit is met or the
        // channel runs out.
        let mut collected: Vec<PlatformMessage> = Vec::new();
        while collected.len() < limit {
            let page_size = (limit - collected.len()).min(MESSAGE_PAGE);
            let mut request = GetMessages::new().limit(page_size as u8);
            if let Some(oldest) = collected.last() {
                request = request.before(oldest.id);
            }
            let page = channel.messages(&self.http, request).await?;
            let short_page = page.len() < page_size;
            collected.extend(page.iter().map(to_platform_message));
            if short_page {
                break;
            }
        }
        Ok(collected)
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &str,
    ) -> Result<(), PlatformError> {
        channel
            .edit_message(&self.http, message, EditMessage::new().content(content))
            .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError> {
        let message = channel
            .send_message(&self.http, CreateMessage::new().content(content))
            .await?;
        Ok(message.id)
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        channel
            .delete_message(&self.http, message)
            .await
            .map_err(Into::into)
    }

    async fn add_thread_member(
        &self,
        thread: ChannelId,
        user: UserId,
    ) -> Result<(), PlatformError> {
        self.http
            .add_thread_channel_member(thread, user)
            .await
            .map_err(Into::into)
    }

    async fn remove_thread_member(
        &self,
        thread: ChannelId,
        user: UserId,
    ) -> Result<(), PlatformError> {
        self.http
            .remove_thread_channel_member(thread, user)
            .await
            .map_err(Into::into)
    }

    async fn set_auto_archive(
        &self,
        thread: ChannelId,
        minutes: u16,
    ) -> Result<(), PlatformError> {
        thread
            .edit_thread(
                &self.http,
                EditThread::new().auto_archive_duration(archive_duration(minutes)),
            )
            .await?;
        Ok(())
    }

    async fn category_channels(
        &self,
        guild: GuildId,
        category: ChannelId,
    ) -> Result<Vec<PlatformChannel>, PlatformError> {
        let channels = guild.channels(&self.http).await?;
        Ok(channels
            .into_values()
            .filter(|c| c.parent_id == Some(category))
            .map(|c| PlatformChannel {
                id: c.id,
                name: c.name,
            })
            .collect())
    }

    async fn channel_viewers(&self, channel: ChannelId) -> Result<Vec<UserId>, PlatformError> {
        let guild_channel = self.guild_channel(channel).await?;
        Ok(guild_channel
            .permission_overwrites
            .iter()
            .filter(|o| o.allow.contains(Permissions::VIEW_CHANNEL))
            .filter_map(|o| match o.kind {
                PermissionOverwriteType::Member(user) => Some(user),
                _ => None,
            })
            .collect())
    }

    async fn create_ticket_channel(
        &self,
        guild: GuildId,
        name: &str,
        category: ChannelId,
        viewer: UserId,
    ) -> Result<ChannelId, PlatformError> {
        let channel = guild
            .create_channel(
                &self.http,
                CreateChannel::new(name)
                    .kind(ChannelType::Text)
                    .category(category)
                    .permissions(vec![PermissionOverwrite {
                        allow: Permissions::VIEW_CHANNEL,
                        deny: Permissions::empty(),
                        kind: PermissionOverwriteType::Member(viewer),
                    }]),
            )
            .await?;
        Ok(channel.id)
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError> {
        channel.delete(&self.http).await?;
        Ok(())
    }

    async fn sync_channel_permissions(
        &self,
        channel: ChannelId,
        category: ChannelId,
    ) -> Result<(), PlatformError> {
        let category_channel = self.guild_channel(category).await?;
        channel
            .edit(
                &self.http,
                EditChannel::new().permissions(category_channel.permission_overwrites),
            )
            .await?;
        Ok(())
    }

    async fn send_embed(
        &self,
        channel: ChannelId,
        title: &str,
        body: &str,
        colour: Option<u32>,
    ) -> Result<MessageId, PlatformError> {
        let mut embed = CreateEmbed::new().title(title).description(body);
        if let Some(colour) = colour {
            embed = embed.colour(Colour::new(colour));
        }
        let message = channel
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await?;
        Ok(message.id)
    }

    async fn send_close_control(&self, channel: ChannelId) -> Result<MessageId, PlatformError> {
        let button = CreateButton::new(CLOSE_TICKET_ID)
            .label("Close ticket")
            .style(ButtonStyle::Danger);
        let message = channel
            .send_message(
                &self.http,
                CreateMessage::new().components(vec![CreateActionRow::Buttons(vec![button])]),
            )
            .await?;
        Ok(message.id)
    }
}
