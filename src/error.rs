//! Error types for the bot.
//!
//! `BotError` is the top-level error type that wraps domain-specific errors.
//! Event handlers never propagate it upward; they log and return, since a
//! failed handler must not take down the gateway connection. Startup code
//! propagates it to `main`, where any error is fatal.

use thiserror::Error;

use crate::config::ConfigError;
use crate::platform::PlatformError;
use crate::registry::RegistryError;
use crate::ticket::TicketError;

/// Top-level application error type.
///
/// Aggregates all error types that can occur in the bot. Most variants use
/// `#[from]` for automatic conversion. Registry and configuration errors at
/// startup are fatal; everything else is reported to the invoker or logged.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration error during startup or environment variable loading.
    #[error(transparent)]
    ConfigErr(#[from] ConfigError),

    /// Game registry error: storage I/O, malformed JSON, or a lookup miss.
    #[error(transparent)]
    RegistryErr(#[from] RegistryError),

    /// Ticket subsystem error: capacity, exhaustion, unknown module.
    #[error(transparent)]
    TicketErr(#[from] TicketError),

    /// Remote platform call failure (rate limit, permissions, stale entity).
    #[error(transparent)]
    PlatformErr(#[from] PlatformError),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size.
    #[error(transparent)]
    DiscordErr(#[from] Box<serenity::Error>),

    /// Cron scheduler error.
    #[error(transparent)]
    SchedulerErr(#[from] tokio_cron_scheduler::JobSchedulerError),
}

/// Manual conversion from serenity::Error to BotError.
///
/// Boxes the error to reduce the size of the BotError enum, as serenity::Error
/// is very large and would make all BotError variants larger if not boxed.
impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::DiscordErr(Box::new(err))
    }
}
