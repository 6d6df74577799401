//! Async driver for the session synchronizer
//!
//! `ChatSession` calls the Persistence and Completion services and feeds
//! their results into [`SessionSynchronizer`] and [`Sidebar`]. The state
//! mutex is only taken between awaits, so a `select_chat` can run while a
//! submission is waiting for its reply.

use crate::error::{ChatdeskError, Result};
use crate::models::{Chat, ChatPatch, ViewMessage};
use crate::relay::CompletionService;
use crate::storage::PersistenceService;
use crate::sync::sidebar::{validate_title, Sidebar};
use crate::sync::state::{Phase, RejectReason, SessionSynchronizer, SubmitTicket};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Who the session acts for and which title rules apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub owner_id: String,
    /// Title used when a chat is created without one
    pub default_title: String,
    /// Longest title accepted on rename or create, in characters
    pub max_title_length: usize,
}

impl SessionContext {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            default_title: "New chat".to_string(),
            max_title_length: 12,
        }
    }
}

impl From<&crate::config::ChatConfig> for SessionContext {
    fn from(config: &crate::config::ChatConfig) -> Self {
        Self {
            owner_id: config.owner_id.clone(),
            default_title: config.default_title.clone(),
            max_title_length: config.max_title_length,
        }
    }
}

/// Result of a submission that raised no error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent
    Rejected(RejectReason),
    /// The reply is stored and the view shows it
    Replied(String),
    /// Another chat was selected meanwhile; the turn finished out of view,
    /// whether the reply was stored or the attempt failed
    Detached,
}

#[derive(Debug, Default)]
struct SessionState {
    sync: SessionSynchronizer,
    sidebar: Sidebar,
}

/// One user's chat session
pub struct ChatSession<P: ?Sized, C: ?Sized> {
    storage: Arc<P>,
    completion: Arc<C>,
    context: SessionContext,
    state: Mutex<SessionState>,
}

impl<P, C> ChatSession<P, C>
where
    P: PersistenceService + ?Sized,
    C: CompletionService + ?Sized,
{
    pub fn new(storage: Arc<P>, completion: Arc<C>, context: SessionContext) -> Self {
        Self {
            storage,
            completion,
            context,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the rendered thread
    pub fn view(&self) -> Vec<ViewMessage> {
        self.state().sync.view().to_vec()
    }

    pub fn phase(&self) -> Phase {
        self.state().sync.phase()
    }

    /// Whether the composer accepts input right now
    pub fn can_submit(&self) -> bool {
        self.state().sync.can_submit()
    }

    pub fn is_busy(&self, chat_id: &str) -> bool {
        self.state().sync.is_busy(chat_id)
    }

    pub fn selected_chat_id(&self) -> Option<String> {
        self.state().sync.selected().map(str::to_string)
    }

    /// The selected chat as the sidebar knows it
    pub fn selected_chat(&self) -> Option<Chat> {
        let state = self.state();
        let id = state.sync.selected()?;
        state.sidebar.get(id).cloned()
    }

    /// Chats in the active (`false`) or archived (`true`) view
    pub fn chats(&self, archived: bool) -> Vec<Chat> {
        self.state()
            .sidebar
            .visible(archived)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Resolve a user-supplied chat reference against the sidebar
    pub fn resolve_chat(&self, query: &str, archived: bool) -> Result<Chat> {
        self.state().sidebar.resolve(query, archived).cloned()
    }

    /// Reload the sidebar from the Persistence Service
    pub async fn refresh_chats(&self) -> Result<Vec<Chat>> {
        let chats = self.storage.list_chats(&self.context.owner_id).await?;
        tracing::debug!(count = chats.len(), "Loaded chat list");
        self.state().sidebar.replace(chats.clone());
        Ok(chats)
    }

    /// Create a chat, put it on top of the sidebar and select it
    ///
    /// A missing or blank title falls back to the default title.
    pub async fn create_chat(&self, title: Option<&str>) -> Result<Chat> {
        let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => validate_title(title, self.context.max_title_length)?,
            None => self.context.default_title.clone(),
        };

        let chat = self
            .storage
            .create_chat(&self.context.owner_id, &title)
            .await?;
        tracing::info!(chat_id = %chat.id, "Created chat");

        self.state().sidebar.insert(chat.clone());
        self.select_chat(&chat.id).await?;
        Ok(chat)
    }

    /// Rename a chat; the title is validated before any service call
    pub async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<()> {
        let title = validate_title(title, self.context.max_title_length)?;
        self.storage
            .update_chat(chat_id, &ChatPatch::title(title.clone()))
            .await?;
        self.state().sidebar.rename(chat_id, &title);
        tracing::info!(chat_id = %chat_id, "Renamed chat");
        Ok(())
    }

    /// Move a chat between the active and archived views
    ///
    /// The selection is left alone; archived chats stay readable.
    pub async fn set_archived(&self, chat_id: &str, archived: bool) -> Result<()> {
        self.storage
            .update_chat(chat_id, &ChatPatch::archived(archived))
            .await?;
        self.state().sidebar.set_archived(chat_id, archived);
        tracing::info!(chat_id = %chat_id, archived, "Changed archive flag");
        Ok(())
    }

    /// Delete a chat and its messages; clears the selection if it was selected
    pub async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        if self.storage.get_chat(chat_id).await?.is_none() {
            return Err(ChatdeskError::NotFound(format!("chat {}", chat_id)).into());
        }
        self.storage.delete_chat(chat_id).await?;

        let mut state = self.state();
        state.sidebar.remove(chat_id);
        if state.sync.selected() == Some(chat_id) {
            state.sync.clear_selection();
        }
        tracing::info!(chat_id = %chat_id, "Deleted chat");
        Ok(())
    }

    /// Select a chat and load its history
    ///
    /// The selection takes effect before any service call, so the last
    /// call wins regardless of which lookup finishes first. Returns `false`
    /// if another selection happened before the history arrived; the
    /// fetched history is then discarded.
    pub async fn select_chat(&self, chat_id: &str) -> Result<bool> {
        let (ticket, known) = {
            let mut state = self.state();
            let known = state.sidebar.get(chat_id).is_some();
            (state.sync.begin_select(chat_id), known)
        };

        if !known {
            let found = match self.storage.get_chat(chat_id).await {
                Ok(found) => found,
                Err(e) => {
                    self.state().sync.abandon_select(&ticket);
                    return Err(e);
                }
            };
            let Some(chat) = found else {
                self.state().sync.abandon_select(&ticket);
                return Err(ChatdeskError::NotFound(format!("chat {}", chat_id)).into());
            };
            self.state().sidebar.insert(chat);
        }

        let messages = match self.storage.list_messages(ticket.chat_id()).await {
            Ok(messages) => messages,
            Err(e) => {
                self.state().sync.abandon_select(&ticket);
                return Err(e);
            }
        };
        Ok(self.state().sync.apply_history(&ticket, messages))
    }

    /// Leave the current chat without selecting another
    pub fn clear_selection(&self) {
        self.state().sync.clear_selection();
    }

    /// Send `text` in the selected chat and wait for the reply
    ///
    /// Validation problems come back as [`SubmitOutcome::Rejected`]. A
    /// persistence or completion failure is returned as an error once;
    /// the user message stays in the view and submitting is possible again.
    /// Once another chat is selected, neither the reply nor a failure is
    /// surfaced and the outcome is [`SubmitOutcome::Detached`].
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome> {
        let ticket = match self.state().sync.begin_submit(text) {
            Ok(ticket) => ticket,
            Err(reason) => {
                tracing::debug!(%reason, "Submission rejected");
                return Ok(SubmitOutcome::Rejected(reason));
            }
        };
        let chat_id = ticket.chat_id().to_string();

        let stored = match self.storage.create_message(&chat_id, text, true).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(chat_id = %chat_id, "Failed to store user message: {}", e);
                return self.fail(&ticket, e);
            }
        };
        {
            let mut state = self.state();
            state.sidebar.touch(&chat_id, stored.created_at);
            state.sync.mark_persisted(&ticket, stored);
        }

        let reply = match self.completion.complete(&chat_id, text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(chat_id = %chat_id, "Completion failed: {}", e);
                return self.fail(&ticket, e);
            }
        };

        let refresh = {
            let mut state = self.state();
            state.sidebar.touch(&chat_id, chrono::Utc::now());
            if state.sync.complete_submit(&ticket) {
                state.sync.refresh_ticket()
            } else {
                None
            }
        };
        let Some(refresh) = refresh else {
            tracing::debug!(chat_id = %chat_id, "Reply stored for a chat that is no longer selected");
            return Ok(SubmitOutcome::Detached);
        };

        let messages = self.storage.list_messages(refresh.chat_id()).await?;
        if self.state().sync.apply_history(&refresh, messages) {
            Ok(SubmitOutcome::Replied(reply))
        } else {
            Ok(SubmitOutcome::Detached)
        }
    }

    /// Surface a failed turn only if its chat is still on screen
    fn fail(&self, ticket: &SubmitTicket, error: anyhow::Error) -> Result<SubmitOutcome> {
        if self.state().sync.fail_submit(ticket) {
            return Err(error);
        }
        tracing::debug!(
            chat_id = %ticket.chat_id(),
            "Dropping failure of a chat that is no longer selected: {}",
            error
        );
        Ok(SubmitOutcome::Detached)
    }
}
