//! Command-line interface definition for Chatdesk
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat, chat list management and transcripts.

use clap::{Parser, Subcommand};

/// Chatdesk - multi-chat assistant in the terminal
///
/// Keep several conversations with a hosted language model, stored in a
/// local SQLite database.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the chat database location
    #[arg(long, value_name = "PATH")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatdesk
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start interactive chat mode
    Chat {
        /// Chat to open on start (id, 8-character id prefix or list number)
        #[arg(long)]
        chat: Option<String>,

        /// Start with the archived chat list
        #[arg(long)]
        show_archived: bool,
    },

    /// Manage chats
    Chats {
        /// Chat management subcommand
        #[command(subcommand)]
        command: ChatsCommand,
    },

    /// Print the stored transcript of a chat
    History {
        /// Chat id, 8-character id prefix or list number
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Chat management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ChatsCommand {
    /// List chats
    List {
        /// Show archived chats instead of active ones
        #[arg(short, long)]
        archived: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a chat
    New {
        /// Title; the configured default title is used when omitted
        title: Option<String>,
    },

    /// Rename a chat
    Rename {
        /// Chat id, prefix or list number
        id: String,
        /// New title
        title: String,
    },

    /// Archive a chat
    Archive {
        /// Chat id, prefix or list number
        id: String,
    },

    /// Move an archived chat back to the active list
    Unarchive {
        /// Chat id, prefix or list number
        id: String,
    },

    /// Delete a chat and its messages
    Delete {
        /// Chat id, prefix or list number
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::Chat {
                chat: None,
                show_archived: false,
            },
        }
    }
}
