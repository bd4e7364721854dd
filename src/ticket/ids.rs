//! Ticket id allocation.
//!
//! Policy: always return the lowest free id in `1..=MAX_TICKET_ID`. Freed
//! ids are reused. Allocation does not mark the id used; the caller records
//! it only after the channel is actually created, so a failed creation
//! leaves the id free.

use std::collections::BTreeSet;

use super::{TicketError, MAX_TICKET_ID};

/// Returns the lowest id in `1..=MAX_TICKET_ID` not present in `used`, or
/// an explicit exhaustion error when the whole space is taken.
pub fn next_ticket_id(used: &BTreeSet<u16>, prefix: &str) -> Result<u16, TicketError> {
    let mut candidate = 1u16;
    for id in used.range(1..=MAX_TICKET_ID) {
        if *id > candidate {
            return Ok(candidate);
        }
        candidate = id + 1;
    }
    if candidate <= MAX_TICKET_ID {
        Ok(candidate)
    } else {
        Err(TicketError::IdSpaceExhausted {
            prefix: prefix.to_string(),
        })
    }
}

/// Parses the numeric suffix of a ticket channel name for a module prefix,
/// accepting only the `{prefix}-NNN` shape.
pub fn parse_ticket_id(name: &str, prefix: &str) -> Option<u16> {
    let suffix = name.strip_prefix(prefix)?.strip_prefix('-')?;
    if suffix.len() != 3 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Formats a ticket channel name from a module prefix and an id.
pub fn ticket_channel_name(prefix: &str, id: u16) -> String {
    format!("{prefix}-{id:03}")
}
