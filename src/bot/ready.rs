//! Startup work on the first ready event.
//!
//! Ready fires again on every gateway reconnect, so everything here must be
//! idempotent: command registration overwrites the previous set, used-id
//! seeding rebuilds from the live category, and the keep-alive scheduler is
//! guarded by a one-shot flag.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serenity::all::{Context, Ready};
use tracing::{error, info, warn};

use crate::platform::discord::DiscordPlatform;
use crate::platform::Platform;
use crate::scheduler::keep_alive::start_keep_alive_scheduler;

use super::{commands, AppState};

/// Handles the ready event: registers commands, rebuilds the ticket used-id
/// sets from the live category, and starts the keep-alive scheduler.
pub async fn handle_ready(app: &Arc<AppState>, ctx: Context, ready: Ready) {
    info!("connected as {}", ready.user.name);

    let platform = DiscordPlatform::new(ctx.http.clone(), ready.user.id);
    let guilds: Vec<_> = ready.guilds.iter().map(|g| g.id).collect();

    for guild in &guilds {
        if let Err(e) = guild.set_commands(&ctx.http, commands::all()).await {
            error!("failed to register commands in guild {guild}: {e}");
        }

        let category = app.ledger.lock().await.category();
        match platform.category_channels(*guild, category).await {
            Ok(channels) => app.ledger.lock().await.seed_used_ids(&channels),
            Err(e) => warn!("failed to scan ticket category in guild {guild}: {e}"),
        }
    }

    if app
        .scheduler_started
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        let platform: Arc<dyn Platform> =
            Arc::new(DiscordPlatform::new(ctx.http.clone(), ready.user.id));
        if let Err(e) = start_keep_alive_scheduler(app.clone(), platform, guilds).await {
            error!("failed to start keep-alive scheduler: {e}");
            app.scheduler_started.store(false, Ordering::SeqCst);
        }
    }
}
