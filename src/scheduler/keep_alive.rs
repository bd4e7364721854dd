//! Daily thread keep-alive job.
//!
//! Discord archives inactive threads once their auto-archive timer runs
//! out, which would silently hide a game's threads from its members. The
//! job resets the countdown on every registered thread by bouncing the
//! auto-archive duration between two values; setting the same value twice
//! does not restart the timer, so the bounce is required.

use std::sync::Arc;

use serenity::all::GuildId;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::bot::AppState;
use crate::error::BotError;
use crate::platform::Platform;

/// Daily at 12:00 UTC.
const KEEP_ALIVE_SCHEDULE: &str = "0 0 12 * * *";

/// The two durations the bounce alternates through, in minutes (3 days,
/// then 7 days as the resting value).
const BOUNCE_MINUTES: u16 = 4320;
const REST_MINUTES: u16 = 10080;

/// Starts the keep-alive scheduler for the given guilds.
pub async fn start_keep_alive_scheduler(
    app: Arc<AppState>,
    platform: Arc<dyn Platform>,
    guilds: Vec<GuildId>,
) -> Result<(), BotError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(KEEP_ALIVE_SCHEDULE, move |_uuid, _lock| {
        let app = app.clone();
        let platform = platform.clone();
        let guilds = guilds.clone();

        Box::pin(async move {
            for guild in guilds {
                if let Err(e) = keep_threads_alive(&app, platform.as_ref(), guild).await {
                    warn!("keep-alive pass failed for guild {guild}: {e}");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("thread keep-alive scheduler started");

    Ok(())
}

/// Resets the auto-archive countdown on every thread of every registered
/// game channel, plus the hub channel's threads. Failures on individual
/// threads are logged and skipped.
async fn keep_threads_alive(
    app: &AppState,
    platform: &dyn Platform,
    guild: GuildId,
) -> Result<(), BotError> {
    let registry = app.registry.lock().await;
    let mut parents: Vec<_> = registry.channel_ids().into_iter().collect();
    if let Some(hub) = registry.hub_channel() {
        parents.push(hub);
    }
    drop(registry);

    let mut kept = 0usize;
    for parent in parents {
        let threads = match platform.threads_of(guild, parent).await {
            Ok(threads) => threads,
            Err(e) => {
                warn!("failed to enumerate threads of {parent}: {e}");
                continue;
            }
        };
        for thread in threads {
            if let Err(e) = platform.set_auto_archive(thread, BOUNCE_MINUTES).await {
                warn!("failed to bounce auto-archive on thread {thread}: {e}");
                continue;
            }
            if let Err(e) = platform.set_auto_archive(thread, REST_MINUTES).await {
                warn!("failed to restore auto-archive on thread {thread}: {e}");
                continue;
            }
            kept += 1;
        }
    }

    info!("keep-alive pass refreshed {kept} thread(s) in guild {guild}");
    Ok(())
}
