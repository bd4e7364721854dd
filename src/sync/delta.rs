//! Membership delta computation for role-change events.

use std::collections::HashSet;

use serenity::all::RoleId;

/// The game roles newly present and newly absent on a member after a
/// role-change event. Transient; recomputed per event, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleDelta {
    pub added: Vec<RoleId>,
    pub removed: Vec<RoleId>,
}

impl RoleDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Computes the game-role delta between a member's role sets before and
/// after an update, restricted to the known game roles. Output is sorted
/// for deterministic processing order.
pub fn topic_role_delta(
    before: &[RoleId],
    after: &[RoleId],
    topic_roles: &HashSet<RoleId>,
) -> RoleDelta {
    let before: HashSet<RoleId> = before.iter().filter(|r| topic_roles.contains(r)).copied().collect();
    let after: HashSet<RoleId> = after.iter().filter(|r| topic_roles.contains(r)).copied().collect();

    let mut added: Vec<RoleId> = after.difference(&before).copied().collect();
    let mut removed: Vec<RoleId> = before.difference(&after).copied().collect();
    added.sort_unstable();
    removed.sort_unstable();

    RoleDelta { added, removed }
}
