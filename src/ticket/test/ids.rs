use std::collections::BTreeSet;

use crate::ticket::ids::{next_ticket_id, parse_ticket_id, ticket_channel_name};
use crate::ticket::{TicketError, MAX_TICKET_ID};

/// Tests the lowest-free-id allocation policy.
///
/// Freed ids are reused: with {1, 2, 4} in use the next ticket gets 3,
/// not 5.
#[test]
fn allocates_the_lowest_free_id() {
    let used: BTreeSet<u16> = [1, 2, 4].into_iter().collect();
    assert_eq!(next_ticket_id(&used, "help").unwrap(), 3);

    assert_eq!(next_ticket_id(&BTreeSet::new(), "help").unwrap(), 1);

    let used: BTreeSet<u16> = [1, 2, 3].into_iter().collect();
    assert_eq!(next_ticket_id(&used, "help").unwrap(), 4);

    let used: BTreeSet<u16> = [2, 3].into_iter().collect();
    assert_eq!(next_ticket_id(&used, "help").unwrap(), 1);
}

/// Tests the explicit exhaustion error when every id is taken.
#[test]
fn exhausted_id_space_is_an_error() {
    let used: BTreeSet<u16> = (1..=MAX_TICKET_ID).collect();
    assert!(matches!(
        next_ticket_id(&used, "help"),
        Err(TicketError::IdSpaceExhausted { .. })
    ));
}

/// Tests strict channel-name parsing.
///
/// Only the exact `{prefix}-NNN` shape counts; near-misses must not leak
/// into a module's used-id set.
#[test]
fn parses_only_the_exact_channel_name_shape() {
    assert_eq!(parse_ticket_id("help-007", "help"), Some(7));
    assert_eq!(parse_ticket_id("help-999", "help"), Some(999));

    assert_eq!(parse_ticket_id("help-07", "help"), None);
    assert_eq!(parse_ticket_id("help-0007", "help"), None);
    assert_eq!(parse_ticket_id("help-abc", "help"), None);
    assert_eq!(parse_ticket_id("help007", "help"), None);
    assert_eq!(parse_ticket_id("report-007", "help"), None);
}

/// Tests zero-padded name formatting and its agreement with the parser.
#[test]
fn channel_names_are_zero_padded() {
    assert_eq!(ticket_channel_name("help", 7), "help-007");
    assert_eq!(ticket_channel_name("help", 42), "help-042");
    assert_eq!(parse_ticket_id(&ticket_channel_name("help", 7), "help"), Some(7));
}
