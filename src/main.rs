//! Gamekeeper: a community-management bot.
//!
//! Keeps a guild's game roles, channels, and threads in lockstep: members
//! who hold a game's role are enrolled into its threads (and withdrawn when
//! the role goes away), new channels and hub threads register themselves as
//! games, and a button-driven ticket system hands out numbered private
//! channels.

mod bot;
mod config;
mod error;
mod platform;
mod registry;
mod scheduler;
mod sync;
mod ticket;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serenity::all::{Client, GatewayIntents};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::bot::{AppState, Handler};
use crate::config::Config;
use crate::error::BotError;
use crate::registry::GameRegistry;
use crate::sync::gate::SyncGate;
use crate::ticket::TicketLedger;

#[tokio::main]
async fn main() -> Result<(), BotError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    // Both documents are required; refusing to start beats running with
    // amnesia and re-registering everything from scratch.
    let registry = GameRegistry::load(&config.registry_path)?;
    let ledger = TicketLedger::load(&config.ticket_path)?;

    let token = config.discord_bot_token.clone();
    let app = Arc::new(AppState {
        config,
        registry: Mutex::new(registry),
        ledger: Mutex::new(ledger),
        gate: SyncGate::new(),
        scheduler_started: AtomicBool::new(false),
    });

    // GUILD_MEMBERS is privileged and must be enabled in the developer
    // portal; without it role-change events never arrive.
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(Handler::new(app))
        .await?;

    info!("starting gamekeeper");
    client.start().await?;

    Ok(())
}
