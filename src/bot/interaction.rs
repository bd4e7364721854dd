//! Slash command and component dispatch.
//!
//! Commands defer first and follow up with a status summary; failures are
//! reported to the invoker rather than swallowed. Component custom ids are
//! structured (`ticket:create:<module>`, `ticket:close`) and looked up in
//! the ledger's module map, so persisted buttons keep working across
//! restarts without pattern matching.

use chrono::Utc;
use serenity::all::{
    ButtonStyle, CommandInteraction, ComponentInteraction, Context, CreateActionRow, CreateButton,
    CreateEmbed, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, Interaction, ResolvedValue, RoleId,
};
use tracing::{error, warn};

use crate::error::BotError;
use crate::platform::discord::DiscordPlatform;
use crate::platform::Platform;
use crate::sync::bulk;
use crate::ticket::{TicketController, CLOSE_TICKET_ID, CREATE_TICKET_PREFIX};

use super::AppState;

/// Routes an interaction to its handler.
pub async fn handle_interaction(app: &AppState, ctx: Context, interaction: Interaction) {
    match interaction {
        Interaction::Command(cmd) => handle_command(app, ctx, cmd).await,
        Interaction::Component(comp) => handle_component(app, ctx, comp).await,
        _ => {}
    }
}

async fn handle_command(app: &AppState, ctx: Context, cmd: CommandInteraction) {
    let Some(guild) = cmd.guild_id else {
        return;
    };
    let user_roles: Vec<RoleId> = cmd
        .member
        .as_ref()
        .map(|m| m.roles.clone())
        .unwrap_or_default();

    // Every command is administrative.
    let admin_role = app.ledger.lock().await.admin_role();
    if !user_roles.contains(&admin_role) {
        respond_ephemeral(&ctx, &cmd, "Insufficient permissions").await;
        return;
    }

    let bot_user = ctx.cache.current_user().id;
    let platform = DiscordPlatform::new(ctx.http.clone(), bot_user);

    match cmd.data.name.as_str() {
        "sync" => sync_command(app, &ctx, &cmd, &platform, guild).await,
        "fix-markers" => fix_markers_command(app, &ctx, &cmd, &platform, guild).await,
        "add-members" => add_members_command(app, &ctx, &cmd, &platform, guild).await,
        "ticket-cleanup" => ticket_cleanup_command(app, &ctx, &cmd, &platform, guild).await,
        "ticket-booth" => ticket_booth_command(app, &ctx, &cmd).await,
        name => warn!("unknown command '{name}'"),
    }
}

/// `/sync role` - bulk reconciliation of a game's thread memberships.
async fn sync_command(
    app: &AppState,
    ctx: &Context,
    cmd: &CommandInteraction,
    platform: &dyn Platform,
    guild: serenity::all::GuildId,
) {
    let Some(role) = role_option(cmd, "role") else {
        respond_ephemeral(ctx, cmd, "Missing role argument").await;
        return;
    };

    let registry = app.registry.lock().await;
    let topic = registry
        .game_of(role.get())
        .map(str::to_string)
        .and_then(|game| registry.topic(&game));
    drop(registry);

    let topic = match topic {
        Ok(topic) => topic,
        Err(_) => {
            respond_ephemeral(ctx, cmd, "That role is not a registered game").await;
            return;
        }
    };

    if let Err(e) = cmd.defer(&ctx.http).await {
        error!("failed to defer /sync: {e}");
        return;
    }

    // Suppress the event-driven synchronizer while the bulk pass runs.
    let _suspension = app.gate.suspend();

    match bulk::sync_role_members(platform, guild, &topic).await {
        Ok(report) => {
            follow_up(
                ctx,
                cmd,
                &format!(
                    "Finished syncing '{}': {} member(s) across {} thread(s), {} failure(s)",
                    topic.name, report.members, report.threads, report.failed_threads
                ),
            )
            .await;
        }
        Err(e) => {
            error!("/sync failed for '{}': {e}", topic.name);
            follow_up(ctx, cmd, &format!("Sync failed: {e}")).await;
        }
    }
}

/// `/fix-markers game` - restore a game's markers to canonical text.
async fn fix_markers_command(
    app: &AppState,
    ctx: &Context,
    cmd: &CommandInteraction,
    platform: &dyn Platform,
    guild: serenity::all::GuildId,
) {
    let Some(game) = string_option(cmd, "game") else {
        respond_ephemeral(ctx, cmd, "Missing game argument").await;
        return;
    };

    let topic = app.registry.lock().await.topic(&game);
    let topic = match topic {
        Ok(topic) => topic,
        Err(e) => {
            respond_ephemeral(ctx, cmd, &format!("{e}")).await;
            return;
        }
    };

    if let Err(e) = cmd.defer(&ctx.http).await {
        error!("failed to defer /fix-markers: {e}");
        return;
    }

    match bulk::repair_markers(platform, guild, &topic).await {
        Ok(repaired) => {
            follow_up(ctx, cmd, &format!("Repaired {repaired} marker(s)")).await;
        }
        Err(e) => {
            error!("/fix-markers failed for '{}': {e}", topic.name);
            follow_up(ctx, cmd, &format!("Repair failed: {e}")).await;
        }
    }
}

/// `/add-members role-from role-to` - bulk role copy with the gate held.
async fn add_members_command(
    app: &AppState,
    ctx: &Context,
    cmd: &CommandInteraction,
    platform: &dyn Platform,
    guild: serenity::all::GuildId,
) {
    let (Some(from), Some(to)) = (role_option(cmd, "role-from"), role_option(cmd, "role-to"))
    else {
        respond_ephemeral(ctx, cmd, "Missing role arguments").await;
        return;
    };

    if let Err(e) = cmd.defer(&ctx.http).await {
        error!("failed to defer /add-members: {e}");
        return;
    }

    // Each grant fires a member-update event; hold the gate so they don't
    // each trigger a full synchronization pass.
    let _suspension = app.gate.suspend();

    let members = match platform.role_members(guild, from).await {
        Ok(members) => members,
        Err(e) => {
            follow_up(ctx, cmd, &format!("Failed to list role members: {e}")).await;
            return;
        }
    };

    let mut added = 0;
    let mut failed = 0;
    for user in &members {
        match platform.add_role(guild, *user, to).await {
            Ok(()) => added += 1,
            Err(e) => {
                warn!("failed to add {user} to role {to}: {e}");
                failed += 1;
            }
        }
    }

    follow_up(
        ctx,
        cmd,
        &format!("Added {added} member(s) to the role, {failed} failure(s)"),
    )
    .await;
}

/// `/ticket-cleanup` - delete stale tickets and report the count.
async fn ticket_cleanup_command(
    app: &AppState,
    ctx: &Context,
    cmd: &CommandInteraction,
    platform: &dyn Platform,
    guild: serenity::all::GuildId,
) {
    if let Err(e) = cmd.defer_ephemeral(&ctx.http).await {
        error!("failed to defer /ticket-cleanup: {e}");
        return;
    }

    let controller = TicketController::new(platform, &app.ledger);
    match controller.clean_tickets(guild, Utc::now()).await {
        Ok(deleted) => follow_up(ctx, cmd, &format!("{deleted} ticket(s) deleted")).await,
        Err(e) => {
            error!("/ticket-cleanup failed: {e}");
            follow_up(ctx, cmd, &format!("Cleanup failed: {e}")).await;
        }
    }
}

/// `/ticket-booth title body` - post an embed plus one creation button per
/// ticket module.
async fn ticket_booth_command(app: &AppState, ctx: &Context, cmd: &CommandInteraction) {
    let (Some(booth_title), Some(body)) = (string_option(cmd, "title"), string_option(cmd, "body"))
    else {
        respond_ephemeral(ctx, cmd, "Missing title or body").await;
        return;
    };

    let buttons: Vec<CreateButton> = app
        .ledger
        .lock()
        .await
        .module_names()
        .map(|name| {
            CreateButton::new(format!("{CREATE_TICKET_PREFIX}{name}"))
                .label(name)
                .style(ButtonStyle::Primary)
        })
        .collect();

    let embed = CreateEmbed::new().title(booth_title).description(body);
    let result = cmd
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .embed(embed)
                .components(vec![CreateActionRow::Buttons(buttons)]),
        )
        .await;

    match result {
        Ok(_) => respond_ephemeral(ctx, cmd, "Ticket booth created").await,
        Err(e) => {
            error!("failed to post ticket booth: {e}");
            respond_ephemeral(ctx, cmd, "Failed to create the ticket booth").await;
        }
    }
}

async fn handle_component(app: &AppState, ctx: Context, comp: ComponentInteraction) {
    let bot_user = ctx.cache.current_user().id;
    let platform = DiscordPlatform::new(ctx.http.clone(), bot_user);
    let controller = TicketController::new(&platform, &app.ledger);

    let custom_id = comp.data.custom_id.clone();
    if custom_id == CLOSE_TICKET_ID {
        let acknowledge = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new().content("Closing ticket..."),
        );
        if let Err(e) = comp.create_response(&ctx.http, acknowledge).await {
            error!("failed to acknowledge close control: {e}");
            return;
        }

        let channel_name = comp
            .channel
            .as_ref()
            .and_then(|c| c.name.clone())
            .unwrap_or_default();
        if let Err(e) = controller.close_ticket(comp.channel_id, &channel_name).await {
            error!("failed to close ticket {channel_name}: {e}");
        }
        return;
    }

    if let Some(module) = custom_id.strip_prefix(CREATE_TICKET_PREFIX) {
        let Some(guild) = comp.guild_id else {
            return;
        };
        if let Err(e) = comp.defer_ephemeral(&ctx.http).await {
            error!("failed to defer ticket creation: {e}");
            return;
        }

        let user_roles: Vec<RoleId> = comp
            .member
            .as_ref()
            .map(|m| m.roles.clone())
            .unwrap_or_default();

        let content = match controller
            .create_ticket(guild, module, comp.user.id, &user_roles)
            .await
        {
            Ok(_) => "Ticket created".to_string(),
            // Capacity and configuration problems are the user's to see;
            // platform failures are not.
            Err(BotError::TicketErr(e)) => format!("ERROR: {e}"),
            Err(e) => {
                error!("ticket creation failed for module '{module}': {e}");
                "ERROR: Failed to create the ticket".to_string()
            }
        };

        if let Err(e) = comp
            .create_followup(
                &ctx.http,
                CreateInteractionResponseFollowup::new().content(content),
            )
            .await
        {
            error!("failed to follow up on ticket creation: {e}");
        }
    }
}

// Option extraction helpers

fn role_option(cmd: &CommandInteraction, name: &str) -> Option<RoleId> {
    cmd.data.options().into_iter().find_map(|opt| {
        if opt.name != name {
            return None;
        }
        match opt.value {
            ResolvedValue::Role(role) => Some(role.id),
            _ => None,
        }
    })
}

fn string_option(cmd: &CommandInteraction, name: &str) -> Option<String> {
    cmd.data.options().into_iter().find_map(|opt| {
        if opt.name != name {
            return None;
        }
        match opt.value {
            ResolvedValue::String(value) => Some(value.to_string()),
            _ => None,
        }
    })
}

async fn respond_ephemeral(ctx: &Context, cmd: &CommandInteraction, content: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(e) = cmd.create_response(&ctx.http, response).await {
        error!("failed to respond to /{}: {e}", cmd.data.name);
    }
}

async fn follow_up(ctx: &Context, cmd: &CommandInteraction, content: &str) {
    if let Err(e) = cmd
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new().content(content),
        )
        .await
    {
        error!("failed to follow up on /{}: {e}", cmd.data.name);
    }
}
