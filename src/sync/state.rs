//! Synchronous state container behind [`crate::sync::ChatSession`]
//!
//! Every transition that follows an `.await` takes the ticket handed out
//! when the operation started. A ticket whose selection or turn is no
//! longer current is stale and its result is dropped, so out-of-order
//! completions can never overwrite the view of another chat.

use crate::models::{Author, LocalId, Message, ViewMessage};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;

/// Where the selected chat is in its send cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight; the view mirrors durable history
    Idle,
    /// Optimistic user message shown, waiting for it to be stored
    Sending,
    /// User message stored, placeholder shown until the reply arrives
    AwaitingReply,
    /// Last submission failed; submitting again is allowed
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Sending => write!(f, "sending"),
            Self::AwaitingReply => write!(f, "awaiting reply"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why a submission was turned away without touching any service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyText,
    NoChatSelected,
    SendInFlight,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyText => write!(f, "message is empty"),
            Self::NoChatSelected => write!(f, "no chat selected"),
            Self::SendInFlight => write!(f, "a reply is still being generated"),
        }
    }
}

/// Identity of one history fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectTicket {
    chat_id: String,
    epoch: u64,
}

impl SelectTicket {
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

/// Identity of one accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    chat_id: String,
    turn: u64,
    local_id: LocalId,
}

impl SubmitTicket {
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Sending,
    AwaitingReply,
}

#[derive(Debug, Clone)]
struct Turn {
    id: u64,
    stage: Stage,
    optimistic: ViewMessage,
}

#[derive(Debug, Clone)]
struct Selection {
    chat_id: String,
    epoch: u64,
}

/// Merged view of durable history and in-flight activity for the selected chat
#[derive(Debug, Default)]
pub struct SessionSynchronizer {
    selection: Option<Selection>,
    epoch: u64,
    next_turn: u64,
    view: Vec<ViewMessage>,
    // Keyed by chat so leaving and re-entering a chat keeps the guard
    in_flight: HashMap<String, Turn>,
    failed: Option<String>,
}

impl SessionSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the selected chat, if any
    pub fn selected(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.chat_id.as_str())
    }

    /// Messages to render, in order
    pub fn view(&self) -> &[ViewMessage] {
        &self.view
    }

    /// Phase of the selected chat
    pub fn phase(&self) -> Phase {
        let Some(chat_id) = self.selected() else {
            return Phase::Idle;
        };
        match self.in_flight.get(chat_id).map(|t| t.stage) {
            Some(Stage::Sending) => Phase::Sending,
            Some(Stage::AwaitingReply) => Phase::AwaitingReply,
            None if self.failed.as_deref() == Some(chat_id) => Phase::Failed,
            None => Phase::Idle,
        }
    }

    /// Whether the composer should be enabled
    pub fn can_submit(&self) -> bool {
        self.selected()
            .is_some_and(|chat_id| !self.in_flight.contains_key(chat_id))
    }

    /// Whether `chat_id` has a turn in flight, selected or not
    pub fn is_busy(&self, chat_id: &str) -> bool {
        self.in_flight.contains_key(chat_id)
    }

    /// Select `chat_id`, empty the view and hand out a ticket for the fetch
    pub fn begin_select(&mut self, chat_id: &str) -> SelectTicket {
        self.epoch += 1;
        self.selection = Some(Selection {
            chat_id: chat_id.to_string(),
            epoch: self.epoch,
        });
        self.view.clear();
        self.failed = None;
        tracing::debug!(chat_id = %chat_id, epoch = self.epoch, "Selected chat");
        SelectTicket {
            chat_id: chat_id.to_string(),
            epoch: self.epoch,
        }
    }

    /// Ticket for re-fetching the current selection without changing it
    pub fn refresh_ticket(&self) -> Option<SelectTicket> {
        self.selection.as_ref().map(|s| SelectTicket {
            chat_id: s.chat_id.clone(),
            epoch: s.epoch,
        })
    }

    /// Undo a selection whose chat could not be loaded
    ///
    /// Only acts if `ticket` is still the current selection; returns whether
    /// the selection was dropped.
    pub fn abandon_select(&mut self, ticket: &SelectTicket) -> bool {
        let current = self.is_current(ticket);
        if current {
            self.clear_selection();
        }
        current
    }

    /// Drop the selection and the view
    pub fn clear_selection(&mut self) {
        self.epoch += 1;
        self.selection = None;
        self.view.clear();
        self.failed = None;
    }

    /// Apply fetched history if `ticket` still names the current selection
    ///
    /// Returns `false` when the result was stale and discarded.
    pub fn apply_history(&mut self, ticket: &SelectTicket, messages: Vec<Message>) -> bool {
        let current = self.is_current(ticket);
        if !current {
            tracing::debug!(
                chat_id = %ticket.chat_id,
                epoch = ticket.epoch,
                "Discarding stale history"
            );
            return false;
        }
        self.reconcile(messages);
        true
    }

    /// Replace the view with durable history of the selected chat
    ///
    /// In-flight activity for the selected chat is re-attached at the tail:
    /// the optimistic message while it is still being stored, the
    /// placeholder while the reply is pending.
    pub fn reconcile(&mut self, messages: Vec<Message>) {
        let Some(chat_id) = self.selected().map(str::to_string) else {
            return;
        };
        self.view = messages
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .map(ViewMessage::Persisted)
            .collect();

        if let Some(turn) = self.in_flight.get(&chat_id) {
            match turn.stage {
                Stage::Sending => self.view.push(turn.optimistic.clone()),
                Stage::AwaitingReply => self.view.push(ViewMessage::Pending { chat_id }),
            }
        }
    }

    /// Accept a submission and append the optimistic user message
    pub fn begin_submit(&mut self, text: &str) -> Result<SubmitTicket, RejectReason> {
        if text.trim().is_empty() {
            return Err(RejectReason::EmptyText);
        }
        let chat_id = self
            .selected()
            .map(str::to_string)
            .ok_or(RejectReason::NoChatSelected)?;
        if self.in_flight.contains_key(&chat_id) {
            return Err(RejectReason::SendInFlight);
        }

        self.next_turn += 1;
        let local_id = LocalId::next();
        let optimistic = ViewMessage::Local {
            id: local_id,
            chat_id: chat_id.clone(),
            author: Author::User,
            content: text.to_string(),
            created_at: Utc::now(),
        };
        self.view.push(optimistic.clone());
        self.in_flight.insert(
            chat_id.clone(),
            Turn {
                id: self.next_turn,
                stage: Stage::Sending,
                optimistic,
            },
        );
        self.failed = None;

        tracing::debug!(chat_id = %chat_id, turn = self.next_turn, "Submission accepted");
        Ok(SubmitTicket {
            chat_id,
            turn: self.next_turn,
            local_id,
        })
    }

    /// The user message is durable; swap the optimistic copy and show the placeholder
    ///
    /// Returns whether the change was rendered.
    pub fn mark_persisted(&mut self, ticket: &SubmitTicket, message: Message) -> bool {
        match self.turn_mut(ticket) {
            Some(turn) => turn.stage = Stage::AwaitingReply,
            None => return false,
        }
        if !self.shows(&ticket.chat_id) {
            return false;
        }

        let position = self
            .view
            .iter()
            .position(|m| matches!(m, ViewMessage::Local { id, .. } if *id == ticket.local_id));
        let already_listed = self
            .view
            .iter()
            .any(|m| matches!(m, ViewMessage::Persisted(p) if p.id == message.id));
        match (position, already_listed) {
            (Some(index), false) => self.view[index] = ViewMessage::Persisted(message),
            (Some(index), true) => {
                self.view.remove(index);
            }
            (None, false) => self.view.push(ViewMessage::Persisted(message)),
            (None, true) => {}
        }

        self.view.retain(|m| !m.is_pending());
        self.view.push(ViewMessage::Pending {
            chat_id: ticket.chat_id.clone(),
        });
        true
    }

    /// The reply arrived; release the guard and drop the placeholder
    ///
    /// Returns whether the chat is still selected, in which case the caller
    /// refreshes history to pick up the reply.
    pub fn complete_submit(&mut self, ticket: &SubmitTicket) -> bool {
        if !self.release(ticket) {
            return false;
        }
        let visible = self.shows(&ticket.chat_id);
        if visible {
            self.view.retain(|m| !m.is_pending());
        } else {
            tracing::debug!(chat_id = %ticket.chat_id, "Reply arrived for a chat that is not selected");
        }
        visible
    }

    /// The turn failed; keep the user message, drop the placeholder, re-enable submit
    ///
    /// Returns whether the failure concerns the selected chat.
    pub fn fail_submit(&mut self, ticket: &SubmitTicket) -> bool {
        if !self.release(ticket) {
            return false;
        }
        let visible = self.shows(&ticket.chat_id);
        if visible {
            self.view.retain(|m| !m.is_pending());
            self.failed = Some(ticket.chat_id.clone());
        }
        visible
    }

    fn is_current(&self, ticket: &SelectTicket) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|s| s.epoch == ticket.epoch && s.chat_id == ticket.chat_id)
    }

    fn shows(&self, chat_id: &str) -> bool {
        self.selected() == Some(chat_id)
    }

    fn turn_mut(&mut self, ticket: &SubmitTicket) -> Option<&mut Turn> {
        self.in_flight
            .get_mut(&ticket.chat_id)
            .filter(|t| t.id == ticket.turn)
    }

    fn release(&mut self, ticket: &SubmitTicket) -> bool {
        if self.turn_mut(ticket).is_none() {
            return false;
        }
        self.in_flight.remove(&ticket.chat_id);
        true
    }
}
