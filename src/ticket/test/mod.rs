use std::io::Write;

use serenity::all::{ChannelId, GuildId, RoleId, UserId};
use tempfile::NamedTempFile;

use crate::ticket::TicketLedger;

mod ids;

const GUILD: GuildId = GuildId::new(1);
const CATEGORY: ChannelId = ChannelId::new(500);
const ADMIN_ROLE: RoleId = RoleId::new(600);
const REQUESTER: UserId = UserId::new(7);

const FIXTURE: &str = r#"{
  "category-id": 500,
  "admin-role": 600,
  "modules": {
    "help": {
      "prefix": "help",
      "intake": [{ "title": "Welcome", "body": "Describe your issue" }]
    },
    "report": { "prefix": "report" }
  }
}"#;

fn ledger_fixture() -> (NamedTempFile, TicketLedger) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();
    let ledger = TicketLedger::load(file.path()).unwrap();
    (file, ledger)
}
