//! Ticket lifecycle operations: creation, stale cleanup, and closing.

use chrono::{DateTime, Duration, Utc};
use serenity::all::{ChannelId, GuildId, RoleId, UserId};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::BotError;
use crate::platform::{user_mention, Platform, PlatformChannel};

use super::ids::{next_ticket_id, parse_ticket_id, ticket_channel_name};
use super::ledger::TicketLedger;
use super::{TicketError, MAX_TICKETS, MAX_TICKETS_PER_USER};

/// Tickets whose earliest message is strictly older than this are stale.
pub fn stale_after() -> Duration {
    Duration::weeks(2)
}

/// What the close control did with the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Permissions were resynced to the category; the channel remains for
    /// moderators.
    Hidden,
    /// The ticket was abandoned before anyone wrote in it; the channel was
    /// deleted outright.
    Deleted,
}

/// Command-driven ticket state machine over the shared ledger.
///
/// The ledger mutex is held across the platform calls of each operation so
/// two interleaved creations can never allocate the same id.
pub struct TicketController<'a> {
    platform: &'a dyn Platform,
    ledger: &'a Mutex<TicketLedger>,
}

impl<'a> TicketController<'a> {
    pub fn new(platform: &'a dyn Platform, ledger: &'a Mutex<TicketLedger>) -> Self {
        Self { platform, ledger }
    }

    /// Whether a user's roles include the configured admin role.
    pub async fn is_admin(&self, user_roles: &[RoleId]) -> bool {
        let admin_role = self.ledger.lock().await.admin_role();
        user_roles.contains(&admin_role)
    }

    /// Opens a ticket for `user` under `module`'s prefix.
    ///
    /// Non-admin users are capped at [`MAX_TICKETS_PER_USER`] open channels
    /// per prefix. The allocated id is recorded as used only after the
    /// channel creation succeeds.
    pub async fn create_ticket(
        &self,
        guild: GuildId,
        module: &str,
        user: UserId,
        user_roles: &[RoleId],
    ) -> Result<ChannelId, BotError> {
        let mut ledger = self.ledger.lock().await;
        let category = ledger.category();
        let exempt = user_roles.contains(&ledger.admin_role());
        let prefix = ledger.module(module)?.prefix.clone();

        let category_channels = self.platform.category_channels(guild, category).await?;
        if category_channels.len() >= MAX_TICKETS {
            return Err(TicketError::CapacityReached { max: MAX_TICKETS }.into());
        }

        if !exempt {
            let open = self
                .count_open_tickets(&category_channels, &prefix, user)
                .await?;
            if open >= MAX_TICKETS_PER_USER {
                return Err(TicketError::CapacityReached {
                    max: MAX_TICKETS_PER_USER,
                }
                .into());
            }
        }

        let id = next_ticket_id(&ledger.module(module)?.used_ids, &prefix)?;
        let name = ticket_channel_name(&prefix, id);

        let channel = self
            .platform
            .create_ticket_channel(guild, &name, category, user)
            .await?;
        ledger.module_mut(module)?.used_ids.insert(id);

        for intake in &ledger.module(module)?.intake {
            self.platform
                .send_embed(channel, &intake.title, &intake.body, intake.colour)
                .await?;
        }
        self.platform
            .send_message(channel, &user_mention(user))
            .await?;
        self.platform.send_close_control(channel).await?;

        info!("opened ticket {name} ({channel}) for {user}");
        Ok(channel)
    }

    /// Deletes every ticket channel whose earliest message is strictly
    /// older than the stale horizon. Returns the number deleted.
    ///
    /// Staleness is judged by the first message's creation time, never the
    /// platform's last-message pointer, which may dangle after deletions.
    pub async fn clean_tickets(
        &self,
        guild: GuildId,
        now: DateTime<Utc>,
    ) -> Result<usize, BotError> {
        let mut ledger = self.ledger.lock().await;
        let category = ledger.category();
        let horizon = now - stale_after();
        let mut deleted = 0;

        for channel in self.platform.category_channels(guild, category).await? {
            let earliest = match self.platform.nth_message(channel.id, 1).await {
                Ok(message) => message.created_at,
                Err(e) => {
                    warn!("skipping ticket channel {} in cleanup: {e}", channel.id);
                    continue;
                }
            };

            // Boundary is exclusive: exactly at the horizon is not yet stale.
            if earliest < horizon {
                match self.platform.delete_channel(channel.id).await {
                    Ok(()) => {
                        ledger.release_channel(&channel.name);
                        deleted += 1;
                    }
                    Err(e) => warn!("failed to delete stale ticket {}: {e}", channel.id),
                }
            }
        }

        info!("ticket cleanup deleted {deleted} channel(s)");
        Ok(deleted)
    }

    /// Handles the close control: resyncs the channel's permissions to the
    /// category (revoking the requester's view grant), and deletes the
    /// channel outright when nobody but the bot ever posted in it.
    pub async fn close_ticket(
        &self,
        channel: ChannelId,
        channel_name: &str,
    ) -> Result<CloseOutcome, BotError> {
        let mut ledger = self.ledger.lock().await;
        let category = ledger.category();

        self.platform
            .sync_channel_permissions(channel, category)
            .await?;

        // The last message is the closing acknowledgement; the one before it
        // tells whether the ticket ever saw real content.
        let recent = self.platform.last_messages(channel, 2).await?;
        let abandoned = recent
            .get(1)
            .is_some_and(|m| m.author == self.platform.current_user_id());

        if abandoned {
            self.platform.delete_channel(channel).await?;
            ledger.release_channel(channel_name);
            info!("deleted abandoned ticket {channel_name}");
            return Ok(CloseOutcome::Deleted);
        }

        info!("hid ticket {channel_name}");
        Ok(CloseOutcome::Hidden)
    }

    /// Counts `user`'s open ticket channels under `prefix`.
    async fn count_open_tickets(
        &self,
        category_channels: &[PlatformChannel],
        prefix: &str,
        user: UserId,
    ) -> Result<usize, BotError> {
        let mut open = 0;
        for channel in category_channels {
            if parse_ticket_id(&channel.name, prefix).is_none() {
                continue;
            }
            if self
                .platform
                .channel_viewers(channel.id)
                .await?
                .contains(&user)
            {
                open += 1;
            }
        }
        Ok(open)
    }
}
