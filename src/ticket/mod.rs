//! Ticket intake workflow: per-module sequential ticket channels under a
//! managed category, with bounded per-user open-ticket counts and
//! stale-ticket reclamation.

pub mod controller;
pub mod ids;
pub mod ledger;
#[cfg(test)]
mod test;

pub use controller::{CloseOutcome, TicketController};
pub use ledger::{IntakeMessage, TicketLedger, TicketModule};

use thiserror::Error;

/// Highest ticket number; channel names carry it zero-padded to 3 digits.
pub const MAX_TICKET_ID: u16 = 999;

/// Operational ceiling on simultaneously open tickets across all modules.
/// Kept comfortably below `MAX_TICKET_ID` so allocation always terminates.
pub const MAX_TICKETS: usize = 500;

/// Open tickets a non-admin user may hold under one module's prefix.
pub const MAX_TICKETS_PER_USER: usize = 3;

/// Component custom id of the persistent close control.
pub const CLOSE_TICKET_ID: &str = "ticket:close";

/// Component custom id prefix of ticket-creation buttons; the module name
/// follows after the final colon.
pub const CREATE_TICKET_PREFIX: &str = "ticket:create:";

#[derive(Error, Debug)]
pub enum TicketError {
    /// Ticket configuration file could not be read.
    #[error("ticket configuration storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Ticket configuration file is not valid JSON for the expected layout.
    #[error("ticket configuration is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// No ticket module is configured under the given name.
    #[error("unknown ticket module: {0}")]
    UnknownModule(String),

    /// The requesting user already holds the maximum number of open tickets.
    #[error("maximum number of open tickets ({max}) reached")]
    CapacityReached { max: usize },

    /// Every id in the module's number space is in use.
    #[error("ticket id space exhausted for prefix '{prefix}'")]
    IdSpaceExhausted { prefix: String },
}
