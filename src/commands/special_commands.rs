//! Special commands parser for interactive chat mode
//!
//! Special commands manage the chat list and the selection instead of being
//! sent as a message. They are prefixed with `/`; the command word is
//! case-insensitive while arguments such as titles keep their case.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Create a chat, optionally titled, and switch to it
    NewChat(Option<String>),

    /// List active chats
    ListChats,

    /// List archived chats
    ListArchived,

    /// Select a chat by list position, id or id prefix
    Open(String),

    /// Rename the selected chat
    Rename(String),

    /// Archive the selected chat
    Archive,

    /// Move the selected chat back to the active list
    Unarchive,

    /// Delete the selected chat and its messages
    Delete,

    /// Re-print the selected chat's thread
    Show,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; the input is a message
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not a valid command.
/// Returns `CommandError::UnsupportedArgument` if a command that takes no argument receives one.
/// Returns `CommandError::MissingArgument` if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use chatdesk::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
/// assert_eq!(
///     parse_special_command("/rename Recepten").unwrap(),
///     SpecialCommand::Rename("Recepten".to_string())
/// );
/// assert_eq!(parse_special_command("Hallo").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // Plain text is a message, except for the bare exit words
    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), rest.trim()),
        None => (lower, ""),
    };
    let arg = (!arg.is_empty()).then(|| arg.to_string());

    let no_argument = |parsed: SpecialCommand| match &arg {
        Some(extra) => Err(CommandError::UnsupportedArgument {
            command: command.clone(),
            arg: extra.clone(),
        }),
        None => Ok(parsed),
    };
    let required = |usage: &str| {
        arg.clone().ok_or_else(|| CommandError::MissingArgument {
            command: command.clone(),
            usage: usage.to_string(),
        })
    };

    match command.as_str() {
        "/new" => Ok(SpecialCommand::NewChat(arg.clone())),
        "/chats" | "/list" => no_argument(SpecialCommand::ListChats),
        "/archived" => no_argument(SpecialCommand::ListArchived),
        "/open" => required("/open <number|id>").map(SpecialCommand::Open),
        "/rename" => required("/rename <title>").map(SpecialCommand::Rename),
        "/archive" => no_argument(SpecialCommand::Archive),
        "/unarchive" => no_argument(SpecialCommand::Unarchive),
        "/delete" => no_argument(SpecialCommand::Delete),
        "/show" => no_argument(SpecialCommand::Show),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(command.clone())),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CHATS:
  /new [title]     - Create a chat and switch to it
  /chats           - List active chats
  /archived        - List archived chats
  /open <n|id>     - Open a chat by list number, id or 8-character id prefix

SELECTED CHAT:
  /rename <title>  - Rename the chat (max length set by chat.max_title_length)
  /archive         - Archive the chat; it stays open and readable
  /unarchive       - Move the chat back to the active list
  /delete          - Delete the chat and all of its messages
  /show            - Print the conversation again

SESSION CONTROL:
  /help, /?        - Show this help message
  exit, quit       - Exit interactive mode

NOTES:
  - Commands are case-insensitive; titles keep their case
  - Regular text (not starting with /) is sent as a message
  - A new message can be sent once the previous reply has arrived
"#
    );
}
