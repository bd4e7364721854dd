//! Durable ticket-module configuration plus the in-memory used-id cache.
//!
//! The configuration file names each ticket module with its channel-name
//! prefix and intake content, and fixes the shared category and admin role.
//! The used-id sets are not persisted: the numeric suffixes of the existing
//! channel names are the durable record, and the sets are rebuilt from a
//! category scan at startup.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serenity::all::{ChannelId, RoleId};
use tracing::debug;

use crate::platform::PlatformChannel;

use super::ids::parse_ticket_id;
use super::TicketError;

/// One preformatted intake embed posted into a fresh ticket channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeMessage {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModuleConfig {
    prefix: String,
    #[serde(default)]
    intake: Vec<IntakeMessage>,
}

/// On-disk layout of the ticket configuration document.
#[derive(Debug, Deserialize)]
struct LedgerFile {
    #[serde(rename = "category-id")]
    category: u64,
    #[serde(rename = "admin-role")]
    admin_role: u64,
    modules: BTreeMap<String, ModuleConfig>,
}

/// A configured ticket module with its used-id cache.
#[derive(Debug)]
pub struct TicketModule {
    pub name: String,
    pub prefix: String,
    pub intake: Vec<IntakeMessage>,
    pub used_ids: BTreeSet<u16>,
}

/// The ticket subsystem's configuration and id bookkeeping.
pub struct TicketLedger {
    category: ChannelId,
    admin_role: RoleId,
    modules: BTreeMap<String, TicketModule>,
}

impl TicketLedger {
    /// Loads the module configuration. Fatal when absent or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TicketError> {
        let raw = fs::read_to_string(path)?;
        let file: LedgerFile = serde_json::from_str(&raw)?;
        Ok(Self {
            category: ChannelId::new(file.category),
            admin_role: RoleId::new(file.admin_role),
            modules: file
                .modules
                .into_iter()
                .map(|(name, config)| {
                    let module = TicketModule {
                        name: name.clone(),
                        prefix: config.prefix,
                        intake: config.intake,
                        used_ids: BTreeSet::new(),
                    };
                    (name, module)
                })
                .collect(),
        })
    }

    /// Rebuilds every module's used-id set from the ticket category's
    /// current channel names. Called once at startup.
    pub fn seed_used_ids(&mut self, channels: &[PlatformChannel]) {
        for module in self.modules.values_mut() {
            module.used_ids = channels
                .iter()
                .filter_map(|c| parse_ticket_id(&c.name, &module.prefix))
                .collect();
            debug!(
                "seeded {} used ticket id(s) for module '{}'",
                module.used_ids.len(),
                module.name
            );
        }
    }

    pub fn category(&self) -> ChannelId {
        self.category
    }

    pub fn admin_role(&self) -> RoleId {
        self.admin_role
    }

    pub fn module(&self, name: &str) -> Result<&TicketModule, TicketError> {
        self.modules
            .get(name)
            .ok_or_else(|| TicketError::UnknownModule(name.to_string()))
    }

    pub fn module_mut(&mut self, name: &str) -> Result<&mut TicketModule, TicketError> {
        self.modules
            .get_mut(name)
            .ok_or_else(|| TicketError::UnknownModule(name.to_string()))
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Releases a deleted channel's id in whichever module owns its prefix.
    pub fn release_channel(&mut self, channel_name: &str) {
        for module in self.modules.values_mut() {
            if let Some(id) = parse_ticket_id(channel_name, &module.prefix) {
                module.used_ids.remove(&id);
            }
        }
    }
}
