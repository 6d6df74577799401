use async_trait::async_trait;
use chatdesk::models::{Chat, ChatPatch, Message};
use chatdesk::relay::CompletionService;
use chatdesk::storage::{MemoryStorage, PersistenceService, SqliteStorage};
use chatdesk::{ChatdeskError, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("chat.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// In-memory storage that counts calls and can hold one lookup or history fetch
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    calls: AtomicUsize,
    held_history: Mutex<Option<String>>,
    held_lookup: Mutex<Option<String>>,
    release: Notify,
}

fn take_hold(slot: &Mutex<Option<String>>, chat_id: &str) -> bool {
    let mut held = slot.lock().unwrap();
    if held.as_deref() == Some(chat_id) {
        held.take().is_some()
    } else {
        false
    }
}

#[allow(dead_code)]
impl CountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of service calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next `list_messages` for `chat_id` wait for [`Self::release`]
    pub fn hold_history(&self, chat_id: &str) {
        *self.held_history.lock().unwrap() = Some(chat_id.to_string());
    }

    /// Make the next `get_chat` for `chat_id` wait for [`Self::release`]
    pub fn hold_lookup(&self, chat_id: &str) {
        *self.held_lookup.lock().unwrap() = Some(chat_id.to_string());
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersistenceService for CountingStorage {
    async fn list_chats(&self, owner_id: &str) -> Result<Vec<Chat>> {
        self.count();
        self.inner.list_chats(owner_id).await
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        self.count();
        if take_hold(&self.held_lookup, chat_id) {
            self.release.notified().await;
        }
        self.inner.get_chat(chat_id).await
    }

    async fn create_chat(&self, owner_id: &str, title: &str) -> Result<Chat> {
        self.count();
        self.inner.create_chat(owner_id, title).await
    }

    async fn update_chat(&self, chat_id: &str, patch: &ChatPatch) -> Result<()> {
        self.count();
        self.inner.update_chat(chat_id, patch).await
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        self.count();
        self.inner.delete_chat(chat_id).await
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.count();
        if take_hold(&self.held_history, chat_id) {
            // Read before waiting so the result reflects the state at call time
            let messages = self.inner.list_messages(chat_id).await;
            self.release.notified().await;
            return messages;
        }
        self.inner.list_messages(chat_id).await
    }

    async fn create_message(
        &self,
        chat_id: &str,
        content: &str,
        is_user: bool,
    ) -> Result<Message> {
        self.count();
        self.inner.create_message(chat_id, content, is_user).await
    }
}

/// Completion that stores a fixed reply, or fails, once it is released
#[allow(dead_code)]
pub struct GatedCompletion<P: ?Sized> {
    storage: Arc<P>,
    reply: Option<String>,
    started: Notify,
    release: Notify,
}

#[allow(dead_code)]
impl<P: PersistenceService + ?Sized> GatedCompletion<P> {
    pub fn new(storage: Arc<P>, reply: &str) -> Self {
        Self {
            storage,
            reply: Some(reply.to_string()),
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Gate that reports a provider failure when released
    pub fn failing(storage: Arc<P>) -> Self {
        Self {
            storage,
            reply: None,
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Wait until a completion request has arrived
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl<P: PersistenceService + ?Sized> CompletionService for GatedCompletion<P> {
    async fn complete(&self, chat_id: &str, _text: &str) -> Result<String> {
        self.started.notify_one();
        self.release.notified().await;
        let Some(reply) = &self.reply else {
            return Err(ChatdeskError::Completion("upstream unavailable".to_string()).into());
        };
        self.storage.create_message(chat_id, reply, false).await?;
        Ok(reply.clone())
    }
}

/// Completion that stores `reply to <text>` immediately
#[allow(dead_code)]
pub struct PersistingCompletion<P: ?Sized> {
    storage: Arc<P>,
}

#[allow(dead_code)]
impl<P: PersistenceService + ?Sized> PersistingCompletion<P> {
    pub fn new(storage: Arc<P>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<P: PersistenceService + ?Sized> CompletionService for PersistingCompletion<P> {
    async fn complete(&self, chat_id: &str, text: &str) -> Result<String> {
        let reply = format!("reply to {}", text);
        self.storage.create_message(chat_id, &reply, false).await?;
        Ok(reply)
    }
}

/// Completion that fails a set number of times, then stores `Hoi!`
#[allow(dead_code)]
pub struct FlakyCompletion<P: ?Sized> {
    storage: Arc<P>,
    failures_left: AtomicUsize,
}

#[allow(dead_code)]
impl<P: PersistenceService + ?Sized> FlakyCompletion<P> {
    pub fn new(storage: Arc<P>, failures: usize) -> Self {
        Self {
            storage,
            failures_left: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl<P: PersistenceService + ?Sized> CompletionService for FlakyCompletion<P> {
    async fn complete(&self, chat_id: &str, _text: &str) -> Result<String> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(ChatdeskError::Completion("provider unavailable".to_string()).into());
        }
        self.storage.create_message(chat_id, "Hoi!", false).await?;
        Ok("Hoi!".to_string())
    }
}
