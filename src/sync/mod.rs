//! Role-to-membership synchronization engine.
//!
//! When a member's role set changes, this module propagates the change to
//! thread membership: a granted game role enrolls the member into every
//! existing thread for that game via the silent-join protocol, and a
//! revoked role (policy permitting) removes them. The registry resolves
//! roles to games and games to channels; the platform does the rest.
//!
//! Failure policy: a platform failure on one thread skips that thread and
//! continues with the batch. Partial application is the accepted degraded
//! state; `/sync` reconciles later.

pub mod bulk;
pub mod delta;
pub mod gate;
pub mod marker;
#[cfg(test)]
mod test;

use serenity::all::{GuildId, RoleId, UserId};
use tracing::{debug, info, warn};

use crate::platform::{user_mention, Platform};
use crate::registry::{GameRegistry, MISC_GAMES};

use delta::topic_role_delta;
use gate::SyncGate;

/// Outcome of one role-change synchronization pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Threads the member was silently added to.
    pub joined: usize,
    /// Threads the member was removed from.
    pub left: usize,
    /// Threads skipped because a platform call failed.
    pub failed: usize,
}

/// The event-driven synchronizer. Constructed per event, borrowing the
/// shared registry and gate.
pub struct MembershipSynchronizer<'a> {
    platform: &'a dyn Platform,
    registry: &'a GameRegistry,
    gate: &'a SyncGate,
    retract_on_removal: bool,
}

impl<'a> MembershipSynchronizer<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        registry: &'a GameRegistry,
        gate: &'a SyncGate,
        retract_on_removal: bool,
    ) -> Self {
        Self {
            platform,
            registry,
            gate,
            retract_on_removal,
        }
    }

    /// Applies a member's role-set change to their thread memberships.
    ///
    /// No-op while the gate is suspended (bulk operations in flight) or when
    /// the delta contains no game roles.
    pub async fn apply_role_change(
        &self,
        guild: GuildId,
        user: UserId,
        before: &[RoleId],
        after: &[RoleId],
    ) -> SyncReport {
        let mut report = SyncReport::default();

        if self.gate.is_suspended() {
            debug!("synchronization suspended, ignoring role change for {user}");
            return report;
        }

        let delta = topic_role_delta(before, after, &self.registry.role_ids());
        if delta.is_empty() {
            return report;
        }

        for role in &delta.added {
            self.enroll(guild, user, *role, &mut report).await;
        }

        if self.retract_on_removal {
            for role in &delta.removed {
                self.withdraw(guild, user, *role, &mut report).await;
            }
        }

        info!(
            "synchronized {user}: joined {} thread(s), left {} thread(s), {} failure(s)",
            report.joined, report.left, report.failed
        );
        report
    }

    /// Silently adds a member to every thread of the game owning `role`.
    async fn enroll(&self, guild: GuildId, user: UserId, role: RoleId, report: &mut SyncReport) {
        let Some(topic) = self.resolve(role) else {
            return;
        };
        // Members pick individual miscellaneous-game threads themselves.
        if topic.name == MISC_GAMES {
            return;
        }

        let mention = user_mention(user);
        for thread in self.threads_in_creation_order(guild, topic.channel).await {
            match marker::silent_add(self.platform, thread, topic.flavor, &topic.name, &mention)
                .await
            {
                Ok(()) => report.joined += 1,
                Err(e) => {
                    warn!("failed to add {user} to thread {thread}: {e}");
                    report.failed += 1;
                }
            }
        }
    }

    /// Removes a member from every thread of the game owning `role`.
    /// Removal generates no mention artifact, so the direct API is safe.
    async fn withdraw(&self, guild: GuildId, user: UserId, role: RoleId, report: &mut SyncReport) {
        let Some(topic) = self.resolve(role) else {
            return;
        };
        if topic.name == MISC_GAMES {
            return;
        }

        for thread in self.threads_in_creation_order(guild, topic.channel).await {
            match self.platform.remove_thread_member(thread, user).await {
                Ok(()) => report.left += 1,
                Err(e) => {
                    warn!("failed to remove {user} from thread {thread}: {e}");
                    report.failed += 1;
                }
            }
        }
    }

    fn resolve(&self, role: RoleId) -> Option<crate::registry::Topic> {
        let game = match self.registry.game_of(role.get()) {
            Ok(game) => game.to_string(),
            Err(e) => {
                warn!("role {role} passed the delta filter but has no game: {e}");
                return None;
            }
        };
        match self.registry.topic(&game) {
            Ok(topic) => Some(topic),
            Err(e) => {
                warn!("failed to resolve game '{game}': {e}");
                None
            }
        }
    }

    /// Threads of a channel in creation order. The platform surfaces them
    /// newest-first; processing must follow creation order so logs and
    /// notifications stay deterministic and human-auditable.
    async fn threads_in_creation_order(&self, guild: GuildId, parent: serenity::all::ChannelId) -> Vec<serenity::all::ChannelId> {
        match self.platform.threads_of(guild, parent).await {
            Ok(mut threads) => {
                threads.reverse();
                threads
            }
            Err(e) => {
                warn!("failed to enumerate threads of {parent}: {e}");
                Vec::new()
            }
        }
    }
}
