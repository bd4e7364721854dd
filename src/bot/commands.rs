//! Slash command definitions.
//!
//! Command names and argument schemas live here; dispatch is in
//! `interaction`. All commands are admin-gated against the configured
//! admin role at dispatch time.

use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption};

/// Builds the full command set registered on ready.
pub fn all() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("sync")
            .description("Reconcile a game's thread memberships with its role")
            .add_option(
                CreateCommandOption::new(CommandOptionType::Role, "role", "The game's role")
                    .required(true),
            ),
        CreateCommand::new("fix-markers")
            .description("Restore a game's thread markers to their canonical text")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "game", "The game's name")
                    .required(true),
            ),
        CreateCommand::new("add-members")
            .description("Add every member of one role to another role")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role-from",
                    "The role to copy members from",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Role,
                    "role-to",
                    "The role to add members to",
                )
                .required(true),
            ),
        CreateCommand::new("ticket-cleanup")
            .description("Delete all tickets older than 2 weeks"),
        CreateCommand::new("ticket-booth")
            .description("Post a ticket booth with one button per ticket module")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "title", "Embed title")
                    .required(true),
            )
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "body", "Embed body text")
                    .required(true),
            ),
    ]
}
