//! In-memory platform double for tests.
//!
//! Holds guild state in a mutex-guarded struct and records every mutation
//! so tests can assert on call order (marker round-trips, thread iteration
//! order) as well as end state. Failures are injected per channel, either
//! on every edit or only after N successful edits (to simulate an
//! interrupted silent-join pair).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serenity::async_trait;

use super::{Platform, PlatformChannel, PlatformError, PlatformMessage};

#[derive(Debug, Clone)]
pub struct MockMessage {
    pub id: MessageId,
    pub author: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct MockState {
    role_members: HashMap<RoleId, Vec<UserId>>,
    created_roles: Vec<(RoleId, String)>,
    deleted_roles: Vec<RoleId>,
    next_role: u64,

    /// Parent channel -> threads, newest first (platform-native order).
    threads: HashMap<ChannelId, Vec<ChannelId>>,
    /// Channel -> messages, oldest first.
    messages: HashMap<ChannelId, Vec<MockMessage>>,
    next_message: u64,

    thread_members: HashMap<ChannelId, Vec<UserId>>,
    auto_archive: Vec<(ChannelId, u16)>,

    channels: HashMap<ChannelId, (String, ChannelId)>,
    viewers: HashMap<ChannelId, Vec<UserId>>,
    deleted_channels: Vec<ChannelId>,
    permission_syncs: Vec<ChannelId>,
    next_channel: u64,

    /// Every content ever written through edit_message, in order.
    edits: Vec<(ChannelId, String)>,

    fail_all_edits: HashSet<ChannelId>,
    /// Channel -> number of edits that still succeed before failing.
    fail_edits_after: HashMap<ChannelId, usize>,
}

pub struct MockPlatform {
    bot_user: UserId,
    state: Mutex<MockState>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            bot_user: UserId::new(999_999),
            state: Mutex::new(MockState {
                next_role: 5000,
                next_channel: 8000,
                next_message: 1,
                ..Default::default()
            }),
        }
    }

    pub fn bot_user(&self) -> UserId {
        self.bot_user
    }

    // Seeding helpers

    pub fn seed_role_members(&self, role: RoleId, members: Vec<UserId>) {
        self.state.lock().unwrap().role_members.insert(role, members);
    }

    /// Registers a thread under a parent. Threads are kept newest-first, so
    /// seed in creation order and the mock prepends.
    pub fn seed_thread(&self, parent: ChannelId, thread: ChannelId) {
        self.state
            .lock()
            .unwrap()
            .threads
            .entry(parent)
            .or_default()
            .insert(0, thread);
    }

    pub fn seed_message(&self, channel: ChannelId, author: UserId, content: &str) -> MessageId {
        self.seed_message_at(channel, author, content, Utc::now())
    }

    pub fn seed_message_at(
        &self,
        channel: ChannelId,
        author: UserId,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> MessageId {
        let mut state = self.state.lock().unwrap();
        let id = MessageId::new(state.next_message);
        state.next_message += 1;
        state.messages.entry(channel).or_default().push(MockMessage {
            id,
            author,
            content: content.to_string(),
            created_at,
        });
        id
    }

    pub fn seed_channel(&self, channel: ChannelId, name: &str, category: ChannelId) {
        self.state
            .lock()
            .unwrap()
            .channels
            .insert(channel, (name.to_string(), category));
    }

    pub fn seed_viewer(&self, channel: ChannelId, user: UserId) {
        self.state
            .lock()
            .unwrap()
            .viewers
            .entry(channel)
            .or_default()
            .push(user);
    }

    // Failure injection

    pub fn fail_edits(&self, channel: ChannelId) {
        self.state.lock().unwrap().fail_all_edits.insert(channel);
    }

    pub fn fail_edits_after(&self, channel: ChannelId, successes: usize) {
        self.state
            .lock()
            .unwrap()
            .fail_edits_after
            .insert(channel, successes);
    }

    // Inspection

    pub fn message_content(&self, channel: ChannelId, index: usize) -> String {
        self.state.lock().unwrap().messages[&channel][index]
            .content
            .clone()
    }

    /// Every content written through edit_message, in call order.
    pub fn edit_log(&self) -> Vec<(ChannelId, String)> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn thread_members(&self, thread: ChannelId) -> Vec<UserId> {
        self.state
            .lock()
            .unwrap()
            .thread_members
            .get(&thread)
            .cloned()
            .unwrap_or_default()
    }

    pub fn deleted_channels(&self) -> Vec<ChannelId> {
        self.state.lock().unwrap().deleted_channels.clone()
    }

    pub fn created_roles(&self) -> Vec<(RoleId, String)> {
        self.state.lock().unwrap().created_roles.clone()
    }

    pub fn deleted_roles(&self) -> Vec<RoleId> {
        self.state.lock().unwrap().deleted_roles.clone()
    }

    pub fn permission_syncs(&self) -> Vec<ChannelId> {
        self.state.lock().unwrap().permission_syncs.clone()
    }

    pub fn channel_name(&self, channel: ChannelId) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .channels
            .get(&channel)
            .map(|(name, _)| name.clone())
    }

    pub fn auto_archive_log(&self) -> Vec<(ChannelId, u16)> {
        self.state.lock().unwrap().auto_archive.clone()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn current_user_id(&self) -> UserId {
        self.bot_user
    }

    async fn role_members(
        &self,
        _guild: GuildId,
        role: RoleId,
    ) -> Result<Vec<UserId>, PlatformError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .role_members
            .get(&role)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_role(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        self.state
            .lock()
            .unwrap()
            .role_members
            .entry(role)
            .or_default()
            .push(user);
        Ok(())
    }

    async fn remove_role(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        if let Some(members) = self.state.lock().unwrap().role_members.get_mut(&role) {
            members.retain(|m| *m != user);
        }
        Ok(())
    }

    async fn create_role(&self, _guild: GuildId, name: &str) -> Result<RoleId, PlatformError> {
        let mut state = self.state.lock().unwrap();
        let role = RoleId::new(state.next_role);
        state.next_role += 1;
        state.created_roles.push((role, name.to_string()));
        Ok(role)
    }

    async fn delete_role(&self, _guild: GuildId, role: RoleId) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.deleted_roles.push(role);
        state.role_members.remove(&role);
        Ok(())
    }

    async fn threads_of(
        &self,
        _guild: GuildId,
        parent: ChannelId,
    ) -> Result<Vec<ChannelId>, PlatformError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .threads
            .get(&parent)
            .cloned()
            .unwrap_or_default())
    }

    async fn nth_message(
        &self,
        channel: ChannelId,
        n: usize,
    ) -> Result<PlatformMessage, PlatformError> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .get(&channel)
            .and_then(|messages| messages.get(n - 1))
            .map(|m| PlatformMessage {
                id: m.id,
                author: m.author,
                content: m.content.clone(),
                created_at: m.created_at,
            })
            .ok_or_else(|| PlatformError::Stale(format!("channel {channel} has no message #{n}")))
    }

    async fn last_messages(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<PlatformMessage>, PlatformError> {
        let state = self.state.lock().unwrap();
        let messages = state.messages.get(&channel).cloned().unwrap_or_default();
        Ok(messages
            .iter()
            .rev()
            .take(limit)
            .map(|m| PlatformMessage {
                id: m.id,
                author: m.author,
                content: m.content.clone(),
                created_at: m.created_at,
            })
            .collect())
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_all_edits.contains(&channel) {
            return Err(PlatformError::Other(format!("injected edit failure in {channel}")));
        }
        if let Some(remaining) = state.fail_edits_after.get_mut(&channel) {
            if *remaining == 0 {
                return Err(PlatformError::Other(format!("injected edit failure in {channel}")));
            }
            *remaining -= 1;
        }
        let found = state
            .messages
            .get_mut(&channel)
            .and_then(|messages| messages.iter_mut().find(|m| m.id == message));
        match found {
            Some(m) => m.content = content.to_string(),
            None => {
                return Err(PlatformError::Stale(format!(
                    "message {message} not found in {channel}"
                )))
            }
        }
        state.edits.push((channel, content.to_string()));
        Ok(())
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError> {
        Ok(self.seed_message(channel, self.bot_user, content))
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        if let Some(messages) = self.state.lock().unwrap().messages.get_mut(&channel) {
            messages.retain(|m| m.id != message);
        }
        Ok(())
    }

    async fn add_thread_member(
        &self,
        thread: ChannelId,
        user: UserId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        let members = state.thread_members.entry(thread).or_default();
        if !members.contains(&user) {
            members.push(user);
        }
        Ok(())
    }

    async fn remove_thread_member(
        &self,
        thread: ChannelId,
        user: UserId,
    ) -> Result<(), PlatformError> {
        if let Some(members) = self.state.lock().unwrap().thread_members.get_mut(&thread) {
            members.retain(|m| *m != user);
        }
        Ok(())
    }

    async fn set_auto_archive(
        &self,
        thread: ChannelId,
        minutes: u16,
    ) -> Result<(), PlatformError> {
        self.state.lock().unwrap().auto_archive.push((thread, minutes));
        Ok(())
    }

    async fn category_channels(
        &self,
        _guild: GuildId,
        category: ChannelId,
    ) -> Result<Vec<PlatformChannel>, PlatformError> {
        let state = self.state.lock().unwrap();
        let mut channels: Vec<PlatformChannel> = state
            .channels
            .iter()
            .filter(|(_, (_, parent))| *parent == category)
            .map(|(id, (name, _))| PlatformChannel {
                id: *id,
                name: name.clone(),
            })
            .collect();
        channels.sort_by_key(|c| c.id);
        Ok(channels)
    }

    async fn channel_viewers(&self, channel: ChannelId) -> Result<Vec<UserId>, PlatformError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .viewers
            .get(&channel)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_ticket_channel(
        &self,
        _guild: GuildId,
        name: &str,
        category: ChannelId,
        viewer: UserId,
    ) -> Result<ChannelId, PlatformError> {
        let mut state = self.state.lock().unwrap();
        let channel = ChannelId::new(state.next_channel);
        state.next_channel += 1;
        state.channels.insert(channel, (name.to_string(), category));
        state.viewers.entry(channel).or_default().push(viewer);
        Ok(channel)
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.channels.remove(&channel);
        state.viewers.remove(&channel);
        state.deleted_channels.push(channel);
        Ok(())
    }

    async fn sync_channel_permissions(
        &self,
        channel: ChannelId,
        _category: ChannelId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.viewers.remove(&channel);
        state.permission_syncs.push(channel);
        Ok(())
    }

    async fn send_embed(
        &self,
        channel: ChannelId,
        title: &str,
        body: &str,
        _colour: Option<u32>,
    ) -> Result<MessageId, PlatformError> {
        Ok(self.seed_message(channel, self.bot_user, &format!("{title}\n{body}")))
    }

    async fn send_close_control(&self, channel: ChannelId) -> Result<MessageId, PlatformError> {
        Ok(self.seed_message(channel, self.bot_user, "[close control]"))
    }
}
