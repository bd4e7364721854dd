//! Durable registry of games and their guild entities.
//!
//! The registry is the single source of truth mapping a game's slug to the
//! IDs of its role, channel/forum, and (in the hub variant) hub thread,
//! plus a handful of fixed guild entity ids the bot needs (categories, log
//! channel, modify-room channel). It is loaded once at startup and rewritten
//! wholesale on every mutation; the bot cannot run without it, so a missing
//! or malformed file is fatal.
//!
//! Single-writer: the registry lives behind one mutex in the handler state,
//! and no other process may write the file.


use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serenity::all::{ChannelId, MessageId, RoleId};
use thiserror::Error;

/// Slug of the miscellaneous-games topic. Members self-select into its
/// individual threads, so bulk enrollment skips it.
pub const MISC_GAMES: &str = "misc-games";

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Registry file could not be read or written.
    #[error("registry storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry file is not valid JSON for the expected layout.
    #[error("registry file is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// No game with the given slug is registered.
    #[error("unknown game: {0}")]
    UnknownGame(String),

    /// No game owns the given role/channel/thread id.
    #[error("no game registered for entity id {0}")]
    UnknownEntity(u64),
}

/// How a game's threads hang off its channel, which determines where the
/// registration marker sits in each thread's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicFlavor {
    /// Threads under a text channel: the bot's marker is the first message.
    #[default]
    Channel,
    /// Forum posts: the author's opening post comes first, the marker second.
    Forum,
}

impl TopicFlavor {
    /// 1-based position of the registration marker in a thread's history.
    pub fn marker_position(self) -> usize {
        match self {
            TopicFlavor::Channel => 1,
            TopicFlavor::Forum => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GameEntry {
    role: u64,
    channel: u64,
    #[serde(rename = "hub-thread", skip_serializing_if = "Option::is_none")]
    hub_thread: Option<u64>,
    #[serde(default)]
    flavor: TopicFlavor,
}

/// On-disk layout: kebab-case fixed keys plus the `entity` map.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(rename = "gaming-category")]
    gaming_category: u64,
    #[serde(rename = "team-category")]
    team_category: u64,
    #[serde(rename = "log-channel")]
    log_channel: u64,
    #[serde(rename = "modify-room-channel")]
    modify_room_channel: u64,
    #[serde(rename = "modify-room-commands-msg")]
    modify_room_commands_msg: u64,
    #[serde(rename = "hub-channel", skip_serializing_if = "Option::is_none")]
    hub_channel: Option<u64>,
    entity: BTreeMap<String, GameEntry>,
}

/// A registered game, resolved to typed ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub role: RoleId,
    pub channel: ChannelId,
    pub hub_thread: Option<ChannelId>,
    pub flavor: TopicFlavor,
}

/// The persistent game registry.
pub struct GameRegistry {
    path: PathBuf,
    file: RegistryFile,
}

impl GameRegistry {
    /// Loads the registry from disk. Fails if the file is absent or
    /// malformed; there is no recovery path, the process must not start.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&path)?;
        let file = serde_json::from_str(&raw)?;
        Ok(Self { path, file })
    }

    /// Registers a game under its slug-normalised name, replacing any
    /// existing entry (last write wins), and flushes before returning.
    pub fn add_game(
        &mut self,
        name: &str,
        role: RoleId,
        channel: ChannelId,
        flavor: TopicFlavor,
        hub_thread: Option<ChannelId>,
    ) -> Result<(), RegistryError> {
        self.file.entity.insert(
            slug(name),
            GameEntry {
                role: role.get(),
                channel: channel.get(),
                hub_thread: hub_thread.map(|t| t.get()),
                flavor,
            },
        );
        self.flush()
    }

    /// Unregisters a game and flushes.
    pub fn delete_game(&mut self, name: &str) -> Result<(), RegistryError> {
        let key = slug(name);
        if self.file.entity.remove(&key).is_none() {
            return Err(RegistryError::UnknownGame(key));
        }
        self.flush()
    }

    /// The full topic record for a game.
    pub fn topic(&self, name: &str) -> Result<Topic, RegistryError> {
        let key = slug(name);
        let entry = self
            .file
            .entity
            .get(&key)
            .ok_or(RegistryError::UnknownGame(key.clone()))?;
        Ok(Topic {
            name: key,
            role: RoleId::new(entry.role),
            channel: ChannelId::new(entry.channel),
            hub_thread: entry.hub_thread.map(ChannelId::new),
            flavor: entry.flavor,
        })
    }

    /// All registered game role ids, for fast membership tests.
    pub fn role_ids(&self) -> HashSet<RoleId> {
        self.file
            .entity
            .values()
            .map(|e| RoleId::new(e.role))
            .collect()
    }

    /// All registered game channel/forum ids.
    pub fn channel_ids(&self) -> HashSet<ChannelId> {
        self.file
            .entity
            .values()
            .map(|e| ChannelId::new(e.channel))
            .collect()
    }

    /// All registered hub thread ids.
    pub fn hub_thread_ids(&self) -> HashSet<ChannelId> {
        self.file
            .entity
            .values()
            .filter_map(|e| e.hub_thread.map(ChannelId::new))
            .collect()
    }

    /// The slug of the game owning a role, channel, or hub thread id.
    pub fn game_of(&self, id: u64) -> Result<&str, RegistryError> {
        self.file
            .entity
            .iter()
            .find(|(_, e)| e.role == id || e.channel == id || e.hub_thread == Some(id))
            .map(|(name, _)| name.as_str())
            .ok_or(RegistryError::UnknownEntity(id))
    }

    pub fn gaming_category(&self) -> ChannelId {
        ChannelId::new(self.file.gaming_category)
    }

    pub fn team_category(&self) -> ChannelId {
        ChannelId::new(self.file.team_category)
    }

    pub fn log_channel(&self) -> ChannelId {
        ChannelId::new(self.file.log_channel)
    }

    pub fn modify_room_channel(&self) -> ChannelId {
        ChannelId::new(self.file.modify_room_channel)
    }

    pub fn modify_room_commands_msg(&self) -> MessageId {
        MessageId::new(self.file.modify_room_commands_msg)
    }

    pub fn hub_channel(&self) -> Option<ChannelId> {
        self.file.hub_channel.map(ChannelId::new)
    }

    /// Rewrites the whole file. BTreeMap keys keep the output deterministic,
    /// so identical states produce identical bytes.
    fn flush(&self) -> Result<(), RegistryError> {
        let json = serde_json::to_string_pretty(&self.file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Normalises a display name to its canonical dash-joined lowercase slug.
pub fn slug(name: &str) -> String {
    name.replace(' ', "-").to_lowercase()
}

/// Converts a slug back to a title-cased display name.
pub fn title(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
