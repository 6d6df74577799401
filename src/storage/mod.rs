//! Persistence Service abstraction and backends
//!
//! The synchronizer and the relay only see [`PersistenceService`]. Two
//! backends are provided: [`SqliteStorage`] for the real application and
//! [`MemoryStorage`] for embedding and tests.

use crate::error::Result;
use crate::models::{Chat, ChatPatch, Message};
use async_trait::async_trait;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Durable record of chats and messages
///
/// Implementations own ordering: `list_chats` returns the most recently
/// updated chat first, `list_messages` returns a chat's messages in
/// ascending creation order with ties kept in insertion order.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// List all chats belonging to `owner_id`, archived ones included
    async fn list_chats(&self, owner_id: &str) -> Result<Vec<Chat>>;

    /// Look up a single chat
    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>>;

    /// Create a chat; `title` is stored as given
    async fn create_chat(&self, owner_id: &str, title: &str) -> Result<Chat>;

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// Returns `ChatdeskError::NotFound` if the chat does not exist
    async fn update_chat(&self, chat_id: &str, patch: &ChatPatch) -> Result<()>;

    /// Delete a chat and all of its messages; deleting a missing chat is a no-op
    async fn delete_chat(&self, chat_id: &str) -> Result<()>;

    /// Messages of a chat in ascending creation order
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    /// Append a message and bump the chat's `updated_at`
    ///
    /// # Errors
    ///
    /// Returns an error if the chat does not exist
    async fn create_message(&self, chat_id: &str, content: &str, is_user: bool)
        -> Result<Message>;
}

/// Generate a new opaque record id
pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
