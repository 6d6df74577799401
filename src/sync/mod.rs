//! Session synchronization
//!
//! Keeps the rendered thread of the selected chat consistent with durable
//! history while a reply is being generated, and keeps the chat list in
//! step with confirmed create, rename, archive and delete operations.

pub mod session;
pub mod sidebar;
pub mod state;

pub use session::{ChatSession, SessionContext, SubmitOutcome};
pub use sidebar::{validate_title, Sidebar};
pub use state::{Phase, RejectReason, SelectTicket, SessionSynchronizer, SubmitTicket};
