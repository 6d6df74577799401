/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: interactive chat mode (sidebar, thread view and composer)
- `chats`: one-shot chat list management
- `history`: print the stored transcript of a chat
*/

use crate::config::Config;
use crate::error::Result;
use crate::models::Chat;
use crate::storage::{PersistenceService, SqliteStorage};
use crate::sync::Sidebar;

pub mod chats;
pub mod history;
pub mod render;

// Special commands parser for the chat loop
pub mod special_commands;

/// Open the SQLite database named by the configuration
pub fn open_storage(config: &Config) -> Result<SqliteStorage> {
    SqliteStorage::open(config.storage.db_path.as_deref())
}

/// Resolve a chat reference (id, 8-character prefix or list position)
///
/// Positions refer to the list printed by `chats list`, or by
/// `chats list --archived` when `archived` is set.
pub async fn resolve_chat<P: PersistenceService + ?Sized>(
    storage: &P,
    owner_id: &str,
    query: &str,
    archived: bool,
) -> Result<Chat> {
    let mut sidebar = Sidebar::new();
    sidebar.replace(storage.list_chats(owner_id).await?);
    sidebar.resolve(query, archived).cloned()
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds the storage, relay and `ChatSession`, then runs a
    //! readline-based loop. Lines starting with `/` manage chats, anything
    //! else is submitted as a message to the selected chat.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::error::ChatdeskError;
    use crate::providers::create_provider;
    use crate::relay::{ChatRelay, CompletionService};
    use crate::sync::{ChatSession, Phase, SessionContext, SubmitOutcome};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::sync::Arc;
    use std::time::Duration;

    /// How long a reply may take before the placeholder is printed
    const PLACEHOLDER_DELAY: Duration = Duration::from_millis(150);

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `chat` - Chat to open first (id, prefix or list position)
    /// * `show_archived` - Start with the archived list instead of the active one
    pub async fn run_chat(config: Config, chat: Option<String>, show_archived: bool) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let storage = Arc::new(open_storage(&config)?);
        let provider = create_provider(&config)?;
        let relay = Arc::new(ChatRelay::new(
            provider,
            storage.clone(),
            &config.completion,
        ));
        let session = ChatSession::new(storage, relay, SessionContext::from(&config.chat));

        session.refresh_chats().await?;

        let mut rl = DefaultEditor::new()?;
        let mut archived_view = show_archived;
        let width = config.chat.sidebar_width;

        render::print_welcome_banner();
        list_chats(&session, archived_view, width);

        if let Some(query) = chat {
            open_chat(&session, &query, archived_view, width).await;
        }

        loop {
            let prompt = render::format_prompt(session.selected_chat().as_ref(), width);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::None => send_message(&session, trimmed).await,
                        SpecialCommand::NewChat(title) => {
                            match session.create_chat(title.as_deref()).await {
                                Ok(chat) => {
                                    archived_view = false;
                                    println!("{}", format!("Created '{}'", chat.title).green());
                                    show_thread(&session, width);
                                }
                                Err(e) => report(&e),
                            }
                        }
                        SpecialCommand::ListChats => {
                            archived_view = false;
                            refresh_and_list(&session, archived_view, width).await;
                        }
                        SpecialCommand::ListArchived => {
                            archived_view = true;
                            refresh_and_list(&session, archived_view, width).await;
                        }
                        SpecialCommand::Open(query) => {
                            open_chat(&session, &query, archived_view, width).await
                        }
                        SpecialCommand::Rename(title) => {
                            if let Some(id) = selected_or_warn(&session) {
                                match session.rename_chat(&id, &title).await {
                                    Ok(()) => println!("{}", "Chat renamed".green()),
                                    Err(e) => report(&e),
                                }
                            }
                        }
                        SpecialCommand::Archive => set_archived(&session, true).await,
                        SpecialCommand::Unarchive => set_archived(&session, false).await,
                        SpecialCommand::Delete => {
                            if let Some(id) = selected_or_warn(&session) {
                                match session.delete_chat(&id).await {
                                    Ok(()) => {
                                        println!("{}", "Chat deleted".green());
                                        list_chats(&session, archived_view, width);
                                    }
                                    Err(e) => report(&e),
                                }
                            }
                        }
                        SpecialCommand::Show => {
                            if selected_or_warn(&session).is_some() {
                                show_thread(&session, width);
                            }
                        }
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Exit => break,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Submit a message and print the reply, showing the placeholder while waiting
    ///
    /// The prompt stays blocked until the turn resolves, so REPL commands
    /// such as `/open` cannot run in the meantime. `ChatSession` itself
    /// allows selecting another chat while a reply is pending.
    async fn send_message<P, C>(session: &ChatSession<P, C>, text: &str)
    where
        P: PersistenceService + ?Sized,
        C: CompletionService + ?Sized,
    {
        let submit = session.submit(text);
        tokio::pin!(submit);

        let mut placeholder_shown = false;
        let result = loop {
            tokio::select! {
                result = &mut submit => break result,
                _ = tokio::time::sleep(PLACEHOLDER_DELAY), if !placeholder_shown => {
                    if session.phase() == Phase::AwaitingReply {
                        if let Some(pending) = session.view().iter().find(|m| m.is_pending()) {
                            println!("{}", render::format_view_message(pending));
                        }
                    }
                    placeholder_shown = true;
                }
            }
        };

        match result {
            Ok(SubmitOutcome::Replied(reply)) => {
                println!("{}: {}\n", "assistant".cyan().bold(), reply);
            }
            Ok(SubmitOutcome::Detached) => {
                println!("{}", "That chat is no longer open; its reply finished in the background.".dimmed());
            }
            Ok(SubmitOutcome::Rejected(reason)) => {
                println!("{}", format!("Not sent: {}", reason).yellow());
                if session.selected_chat_id().is_none() {
                    println!("Use {} or {} first.", "/new".cyan(), "/open <n>".cyan());
                }
            }
            Err(e) => {
                report(&e);
                println!("{}", "Your message was kept; you can try again.".dimmed());
            }
        }
    }

    async fn set_archived<P, C>(session: &ChatSession<P, C>, archived: bool)
    where
        P: PersistenceService + ?Sized,
        C: CompletionService + ?Sized,
    {
        let Some(id) = selected_or_warn(session) else {
            return;
        };
        match session.set_archived(&id, archived).await {
            Ok(()) if archived => println!("{}", "Chat archived".green()),
            Ok(()) => println!("{}", "Chat restored".green()),
            Err(e) => report(&e),
        }
    }

    async fn open_chat<P, C>(session: &ChatSession<P, C>, query: &str, archived: bool, width: usize)
    where
        P: PersistenceService + ?Sized,
        C: CompletionService + ?Sized,
    {
        let chat = match session.resolve_chat(query, archived) {
            Ok(chat) => chat,
            Err(e) => return report(&e),
        };
        match session.select_chat(&chat.id).await {
            Ok(true) => show_thread(session, width),
            Ok(false) => tracing::debug!("Selection changed while loading history"),
            Err(e) => report(&e),
        }
    }

    fn show_thread<P, C>(session: &ChatSession<P, C>, width: usize)
    where
        P: PersistenceService + ?Sized,
        C: CompletionService + ?Sized,
    {
        let title = session
            .selected_chat()
            .map(|c| crate::models::truncate_title(&c.title, width))
            .unwrap_or_default();
        render::print_thread(&title, &session.view());
    }

    fn list_chats<P, C>(session: &ChatSession<P, C>, archived: bool, width: usize)
    where
        P: PersistenceService + ?Sized,
        C: CompletionService + ?Sized,
    {
        let heading = if archived { "Archived chats" } else { "Chats" };
        let selected = session.selected_chat_id();
        render::print_chat_list(
            heading,
            &session.chats(archived),
            selected.as_deref(),
            width,
            &|id| session.is_busy(id),
        );
    }

    async fn refresh_and_list<P, C>(session: &ChatSession<P, C>, archived: bool, width: usize)
    where
        P: PersistenceService + ?Sized,
        C: CompletionService + ?Sized,
    {
        if let Err(e) = session.refresh_chats().await {
            report(&e);
        }
        list_chats(session, archived, width);
    }

    fn selected_or_warn<P, C>(session: &ChatSession<P, C>) -> Option<String>
    where
        P: PersistenceService + ?Sized,
        C: CompletionService + ?Sized,
    {
        let selected = session.selected_chat_id();
        if selected.is_none() {
            println!("{}", "No chat selected. Use /new or /open <n>.".yellow());
        }
        selected
    }

    fn report(error: &anyhow::Error) {
        match error.downcast_ref::<ChatdeskError>() {
            Some(ChatdeskError::Validation(msg)) => {
                eprintln!("{}", format!("Invalid input: {}", msg).yellow())
            }
            _ => eprintln!("{}", format!("Error: {}", error).red()),
        }
    }
}
