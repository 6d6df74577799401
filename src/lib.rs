//! Chatdesk - multi-chat assistant library
//!
//! This library provides the chat list, the session synchronizer that keeps
//! a thread consistent while a reply is generated, the persistence and
//! completion services it talks to, and the terminal front-end.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `sync`: Session synchronizer, sidebar state and the async `ChatSession`
//! - `storage`: Persistence Service trait with SQLite and in-memory backends
//! - `relay`: Completion Service that calls the provider and stores replies
//! - `providers`: Chat-completions provider abstraction and implementation
//! - `models`: Chat, message and view types
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatdesk::relay::ChatRelay;
//! use chatdesk::storage::SqliteStorage;
//! use chatdesk::sync::{ChatSession, SessionContext};
//! use chatdesk::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let storage = Arc::new(SqliteStorage::open(config.storage.db_path.as_deref())?);
//!     let provider = chatdesk::providers::create_provider(&config)?;
//!     let relay = Arc::new(ChatRelay::new(provider, storage.clone(), &config.completion));
//!     let session = ChatSession::new(storage, relay, SessionContext::from(&config.chat));
//!
//!     session.create_chat(Some("Recepten")).await?;
//!     session.submit("Hallo").await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod relay;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChatdeskError, Result};
pub use models::{Author, Chat, ChatPatch, Message, ViewMessage};
pub use sync::{ChatSession, SessionContext, SubmitOutcome};

#[cfg(test)]
pub mod test_utils;
