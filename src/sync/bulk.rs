//! Bulk membership reconciliation for a whole game role.
//!
//! `/sync` forces a game's thread memberships back into agreement with its
//! role membership, bypassing the one-event-at-a-time trigger. Mentioning a
//! role in the marker-edit pair enrolls every member of that role in one
//! pair of edits, collapsing O(members) calls to O(threads). A single mass
//! mention against a huge role is unsafe, so the member list is partitioned
//! into chunks; each chunk beyond the first requires a temporary proxy role
//! carrying exactly that chunk's members.
//!
//! Re-running is idempotent: enrolling an existing thread member changes
//! nothing, and every marker ends back at its original text.

use serenity::all::{GuildId, UserId};
use tracing::{info, warn};

use crate::platform::{role_mention, Platform, PlatformError};
use crate::registry::Topic;

use super::marker;

/// Platform-imposed ceiling on members reachable through one role mention.
pub const SYNC_CHUNK_SIZE: usize = 99;

/// Outcome of a bulk sync pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BulkSyncReport {
    pub members: usize,
    pub threads: usize,
    pub failed_threads: usize,
}

/// Reconciles every thread of `topic` with the current members of its role.
///
/// The caller must hold a gate suspension for the duration so the
/// event-driven synchronizer does not interleave marker edits.
pub async fn sync_role_members(
    platform: &dyn Platform,
    guild: GuildId,
    topic: &Topic,
) -> Result<BulkSyncReport, PlatformError> {
    let members = platform.role_members(guild, topic.role).await?;

    let mut threads = platform.threads_of(guild, topic.channel).await?;
    threads.reverse();

    let mut report = BulkSyncReport {
        members: members.len(),
        ..Default::default()
    };

    if members.len() <= SYNC_CHUNK_SIZE {
        // One chunk: mention the real role directly.
        run_marker_pass(platform, topic, &threads, &role_mention(topic.role), &mut report).await;
        info!(
            "bulk sync of '{}': {} member(s), {} thread(s), {} failure(s)",
            topic.name, report.members, report.threads, report.failed_threads
        );
        return Ok(report);
    }

    for (index, chunk) in members.chunks(SYNC_CHUNK_SIZE).enumerate() {
        if let Err(e) = sync_chunk(platform, guild, topic, index, chunk, &threads, &mut report).await
        {
            warn!("bulk sync chunk {index} of '{}' failed: {e}", topic.name);
        }
    }

    info!(
        "bulk sync of '{}': {} member(s), {} thread(s), {} failure(s)",
        topic.name, report.members, report.threads, report.failed_threads
    );
    Ok(report)
}

/// Enrolls one chunk of members through a temporary proxy role.
async fn sync_chunk(
    platform: &dyn Platform,
    guild: GuildId,
    topic: &Topic,
    index: usize,
    chunk: &[UserId],
    threads: &[serenity::all::ChannelId],
    report: &mut BulkSyncReport,
) -> Result<(), PlatformError> {
    let proxy = platform
        .create_role(guild, &format!("{}-sync-{index}", topic.name))
        .await?;

    for user in chunk {
        if let Err(e) = platform.add_role(guild, *user, proxy).await {
            warn!("failed to add {user} to proxy role {proxy}: {e}");
        }
    }

    run_marker_pass(platform, topic, threads, &role_mention(proxy), report).await;

    // The proxy exists only for the mention; delete it even if some thread
    // passes failed, so no sync roles accumulate in the guild.
    platform.delete_role(guild, proxy).await?;
    Ok(())
}

/// Runs the silent-add edit pair with a mention across every thread.
async fn run_marker_pass(
    platform: &dyn Platform,
    topic: &Topic,
    threads: &[serenity::all::ChannelId],
    mention: &str,
    report: &mut BulkSyncReport,
) {
    for thread in threads {
        match marker::silent_add(platform, *thread, topic.flavor, &topic.name, mention).await {
            Ok(()) => report.threads += 1,
            Err(e) => {
                warn!("bulk sync failed on thread {thread}: {e}");
                report.failed_threads += 1;
            }
        }
    }
}

/// Restores every marker of a game to its canonical text.
pub async fn repair_markers(
    platform: &dyn Platform,
    guild: GuildId,
    topic: &Topic,
) -> Result<usize, PlatformError> {
    let mut threads = platform.threads_of(guild, topic.channel).await?;
    threads.reverse();

    let mut repaired = 0;
    for thread in threads {
        match marker::repair_marker(platform, thread, topic.flavor, &topic.name).await {
            Ok(true) => repaired += 1,
            Ok(false) => {}
            Err(e) => warn!("failed to repair marker in thread {thread}: {e}"),
        }
    }
    Ok(repaired)
}
