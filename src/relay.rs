//! Completion relay
//!
//! Forwards one user message to the language-model provider, stores the
//! assistant reply through the Persistence Service and hands the reply back.

use crate::config::CompletionConfig;
use crate::error::{ChatdeskError, Result};
use crate::providers::{Message, Provider};
use crate::storage::PersistenceService;
use async_trait::async_trait;
use std::sync::Arc;

/// Opaque service that turns a user message into an assistant reply
///
/// Implementations are responsible for making the reply durable; the
/// synchronizer only re-reads history once `complete` returns.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Produce the assistant reply for `text` in `chat_id`
    async fn complete(&self, chat_id: &str, text: &str) -> Result<String>;
}

/// [`CompletionService`] backed by a [`Provider`] and a [`PersistenceService`]
pub struct ChatRelay<P: ?Sized> {
    provider: Box<dyn Provider>,
    storage: Arc<P>,
    system_prompt: String,
}

impl<P: PersistenceService + ?Sized> ChatRelay<P> {
    /// Build a relay from the completion settings
    pub fn new(provider: Box<dyn Provider>, storage: Arc<P>, config: &CompletionConfig) -> Self {
        Self {
            provider,
            storage,
            system_prompt: config.system_prompt.clone(),
        }
    }
}

#[async_trait]
impl<P: PersistenceService + ?Sized> CompletionService for ChatRelay<P> {
    async fn complete(&self, chat_id: &str, text: &str) -> Result<String> {
        let messages = vec![Message::system(&self.system_prompt), Message::user(text)];

        tracing::debug!(chat_id = %chat_id, "Relaying message to provider");
        let response = self.provider.complete(&messages).await.map_err(|e| {
            tracing::warn!(chat_id = %chat_id, "Provider call failed: {}", e);
            ChatdeskError::Completion(e.to_string())
        })?;

        let reply = response
            .text()
            .ok_or_else(|| ChatdeskError::Completion("invalid response from provider".into()))?
            .to_string();

        self.storage
            .create_message(chat_id, &reply, false)
            .await
            .map_err(|e| {
                tracing::error!(chat_id = %chat_id, "Failed to store reply: {}", e);
                ChatdeskError::Completion(format!("failed to store reply: {}", e))
            })?;

        tracing::info!(chat_id = %chat_id, "Stored assistant reply");
        Ok(reply)
    }
}
