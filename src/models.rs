//! Chat and message types shared by storage, relay and the synchronizer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A conversation owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Opaque identifier assigned by the Persistence Service
    pub id: String,
    /// Free-text title, truncated for display only
    pub title: String,
    /// Owner reference
    pub owner_id: String,
    /// Archived chats are hidden from the default sidebar listing
    pub archived: bool,
    /// When the chat was created
    pub created_at: DateTime<Utc>,
    /// When the chat or one of its messages last changed
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Title shortened to at most `width` characters for sidebar display
    pub fn display_title(&self, width: usize) -> String {
        truncate_title(&self.title, width)
    }
}

/// Shorten `title` to `width` characters, marking the cut with `...`
///
/// # Examples
///
/// ```
/// use chatdesk::models::truncate_title;
///
/// assert_eq!(truncate_title("Boodschappen", 8), "Boods...");
/// assert_eq!(truncate_title("Kort", 8), "Kort");
/// ```
pub fn truncate_title(title: &str, width: usize) -> String {
    let count = title.chars().count();
    if count <= width {
        return title.to_string();
    }
    if width <= 3 {
        return title.chars().take(width).collect();
    }
    let kept: String = title.chars().take(width - 3).collect();
    format!("{}...", kept)
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

impl Author {
    /// Map the persisted `is_user` flag to an author
    pub fn from_is_user(is_user: bool) -> Self {
        if is_user {
            Self::User
        } else {
            Self::Assistant
        }
    }

    /// Whether this author is the human side of the chat
    pub fn is_user(self) -> bool {
        matches!(self, Self::User)
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message as recorded by the Persistence Service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier assigned by the Persistence Service
    pub id: String,
    /// Parent chat
    pub chat_id: String,
    /// User or assistant
    pub author: Author,
    /// Text content
    pub content: String,
    /// Creation timestamp, the ordering key within a chat
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether the message was written by the user
    pub fn is_user(&self) -> bool {
        self.author.is_user()
    }
}

/// Partial update applied by `update_chat`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatPatch {
    /// New title, if changing
    pub title: Option<String>,
    /// New archived flag, if changing
    pub archived: Option<bool>,
}

impl ChatPatch {
    /// Patch that only renames
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            archived: None,
        }
    }

    /// Patch that only toggles the archived flag
    pub fn archived(archived: bool) -> Self {
        Self {
            title: None,
            archived: Some(archived),
        }
    }
}

/// Identifier for an optimistic message that has no server id yet
///
/// Local ids come from a process-wide counter and are never parsed from or
/// compared against persisted ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(u64);

impl LocalId {
    /// Allocate a fresh local id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local-{}", self.0)
    }
}

/// One entry of the rendered thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMessage {
    /// Optimistic copy shown before the server confirms it
    Local {
        id: LocalId,
        chat_id: String,
        author: Author,
        content: String,
        created_at: DateTime<Utc>,
    },
    /// Message from durable history
    Persisted(Message),
    /// Stand-in for the assistant reply being composed; never stored
    Pending { chat_id: String },
}

impl ViewMessage {
    /// Author of the entry; the placeholder is always the assistant
    pub fn author(&self) -> Author {
        match self {
            Self::Local { author, .. } => *author,
            Self::Persisted(message) => message.author,
            Self::Pending { .. } => Author::Assistant,
        }
    }

    /// Whether the entry was written by the user
    pub fn is_user(&self) -> bool {
        self.author().is_user()
    }

    /// Text to display; `None` for the placeholder
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Local { content, .. } => Some(content),
            Self::Persisted(message) => Some(&message.content),
            Self::Pending { .. } => None,
        }
    }

    /// Chat this entry belongs to
    pub fn chat_id(&self) -> &str {
        match self {
            Self::Local { chat_id, .. } | Self::Pending { chat_id } => chat_id,
            Self::Persisted(message) => &message.chat_id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

impl From<Message> for ViewMessage {
    fn from(message: Message) -> Self {
        Self::Persisted(message)
    }
}
