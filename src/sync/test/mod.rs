use std::io::Write;

use serenity::all::{ChannelId, GuildId, RoleId, UserId};
use tempfile::NamedTempFile;

use crate::platform::mock::MockPlatform;
use crate::registry::GameRegistry;
use crate::sync::marker::marker_text;

mod marker;

const GUILD: GuildId = GuildId::new(1);
const VALHEIM_ROLE: RoleId = RoleId::new(10);
const VALHEIM_CHANNEL: ChannelId = ChannelId::new(20);
const MISC_ROLE: RoleId = RoleId::new(11);
const MEMBER: UserId = UserId::new(7);

const FIXTURE: &str = r#"{
  "gaming-category": 100,
  "team-category": 101,
  "log-channel": 102,
  "modify-room-channel": 103,
  "modify-room-commands-msg": 104,
  "entity": {
    "misc-games": { "role": 11, "channel": 21 },
    "valheim": { "role": 10, "channel": 20 }
  }
}"#;

/// A registry with one normal game and the miscellaneous-games topic. The
/// temp file must stay alive for the registry's flushes.
fn registry_fixture() -> (NamedTempFile, GameRegistry) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();
    let registry = GameRegistry::load(file.path()).unwrap();
    (file, registry)
}

/// Seeds two valheim threads in creation order, each with its marker as
/// the first message. Returns the thread ids oldest first.
fn seed_valheim_threads(platform: &MockPlatform) -> Vec<ChannelId> {
    let threads = vec![ChannelId::new(301), ChannelId::new(302)];
    for thread in &threads {
        platform.seed_thread(VALHEIM_CHANNEL, *thread);
        platform.seed_message(*thread, platform.bot_user(), &marker_text("valheim"));
    }
    threads
}
