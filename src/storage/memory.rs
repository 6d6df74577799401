use crate::error::{ChatdeskError, Result};
use crate::models::{Author, Chat, ChatPatch, Message};
use crate::storage::{new_record_id, PersistenceService};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process Persistence Service
///
/// Keeps the same ordering contract as [`crate::storage::SqliteStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    chats: HashMap<String, Chat>,
    // Append-only per chat, so insertion order breaks timestamp ties
    messages: HashMap<String, Vec<Message>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| ChatdeskError::Storage("memory store lock poisoned".into()).into())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| ChatdeskError::Storage("memory store lock poisoned".into()).into())
    }
}

#[async_trait]
impl PersistenceService for MemoryStorage {
    async fn list_chats(&self, owner_id: &str) -> Result<Vec<Chat>> {
        let inner = self.read()?;
        let mut chats: Vec<Chat> = inner
            .chats
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(chats)
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        Ok(self.read()?.chats.get(chat_id).cloned())
    }

    async fn create_chat(&self, owner_id: &str, title: &str) -> Result<Chat> {
        let now = Utc::now();
        let chat = Chat {
            id: new_record_id(),
            title: title.to_string(),
            owner_id: owner_id.to_string(),
            archived: false,
            created_at: now,
            updated_at: now,
        };
        self.write()?.chats.insert(chat.id.clone(), chat.clone());
        Ok(chat)
    }

    async fn update_chat(&self, chat_id: &str, patch: &ChatPatch) -> Result<()> {
        let mut inner = self.write()?;
        let chat = inner
            .chats
            .get_mut(chat_id)
            .ok_or_else(|| ChatdeskError::NotFound(format!("chat {}", chat_id)))?;

        if let Some(title) = &patch.title {
            chat.title = title.clone();
        }
        if let Some(archived) = patch.archived {
            chat.archived = archived;
        }
        chat.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let mut inner = self.write()?;
        inner.chats.remove(chat_id);
        inner.messages.remove(chat_id);
        Ok(())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let inner = self.read()?;
        let mut messages = inner.messages.get(chat_id).cloned().unwrap_or_default();
        // Stable sort keeps insertion order for equal timestamps
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn create_message(
        &self,
        chat_id: &str,
        content: &str,
        is_user: bool,
    ) -> Result<Message> {
        let mut inner = self.write()?;
        let now = Utc::now();
        let chat = inner
            .chats
            .get_mut(chat_id)
            .ok_or_else(|| ChatdeskError::NotFound(format!("chat {}", chat_id)))?;
        chat.updated_at = now;

        let message = Message {
            id: new_record_id(),
            chat_id: chat_id.to_string(),
            author: Author::from_is_user(is_user),
            content: content.to_string(),
            created_at: now,
        };
        inner
            .messages
            .entry(chat_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(message)
    }
}
