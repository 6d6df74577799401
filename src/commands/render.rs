//! Terminal rendering for the chat front-end
//!
//! Formatting functions return strings so they can be tested; the `print_*`
//! wrappers write them to stdout.

use crate::models::{truncate_title, Author, Chat, Message, ViewMessage};
use colored::Colorize;
use prettytable::{format, Table};

/// Text shown in place of the assistant reply while it is being generated
pub const PLACEHOLDER_TEXT: &str = "...";

/// Display welcome banner at the start of interactive chat mode
pub fn print_welcome_banner() {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║               Chatdesk - Welcome to your assistant           ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("{}", "Guidelines".bold());
    println!("  • Verify responses for critical matters");
    println!("  • Only share necessary confidential data");
    println!("  • Provide feedback to improve accuracy\n");
    println!("{}", "Warnings".bold().yellow());
    println!("  • AI may occasionally generate incorrect information");
    println!("  • Limited to pre-trained data");
    println!("  • Verify important information\n");
    println!("Type a message to chat, '/help' for commands, 'exit' to quit\n");
}

fn speaker(author: Author) -> String {
    match author {
        Author::User => "you".green().bold().to_string(),
        Author::Assistant => "assistant".cyan().bold().to_string(),
    }
}

/// One rendered line (or block) of the thread
pub fn format_view_message(message: &ViewMessage) -> String {
    match message {
        ViewMessage::Pending { .. } => {
            format!("{}: {}", speaker(Author::Assistant), PLACEHOLDER_TEXT.dimmed())
        }
        ViewMessage::Local { content, .. } => {
            format!("{}: {} {}", speaker(Author::User), content, "(sending)".dimmed())
        }
        ViewMessage::Persisted(message) => {
            format!("{}: {}", speaker(message.author), message.content)
        }
    }
}

/// Print the whole thread of the selected chat
pub fn print_thread(title: &str, messages: &[ViewMessage]) {
    println!("\n── {} ──", title.bold());
    if messages.is_empty() {
        println!("{}", "No messages yet. Say hello!".dimmed());
    }
    for message in messages {
        println!("{}", format_view_message(message));
    }
    println!();
}

/// Plain-text transcript line used by the `history` command
pub fn format_transcript_line(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.author,
        message.content
    )
}

/// Build the sidebar table
///
/// Positions are 1-based so `/open <n>` can refer to them. The selected
/// chat is marked with `*`, a chat waiting for a reply with `…`.
pub fn chat_table(
    chats: &[Chat],
    selected: Option<&str>,
    title_width: usize,
    busy: &dyn Fn(&str) -> bool,
) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.set_titles(prettytable::row![
        "#".bold(),
        "".bold(),
        "ID".bold(),
        "Title".bold(),
        "Last Updated".bold()
    ]);

    for (index, chat) in chats.iter().enumerate() {
        let marker = match (selected == Some(chat.id.as_str()), busy(&chat.id)) {
            (true, true) => "*…",
            (true, false) => "*",
            (false, true) => "…",
            (false, false) => "",
        };
        let id_short: String = chat.id.chars().take(8).collect();
        table.add_row(prettytable::row![
            index + 1,
            marker,
            id_short.cyan(),
            truncate_title(&chat.title, title_width),
            chat.updated_at.format("%Y-%m-%d %H:%M").to_string()
        ]);
    }
    table
}

/// Print one of the sidebar views
pub fn print_chat_list(
    heading: &str,
    chats: &[Chat],
    selected: Option<&str>,
    title_width: usize,
    busy: &dyn Fn(&str) -> bool,
) {
    if chats.is_empty() {
        println!("{}", format!("No {} found.", heading.to_lowercase()).yellow());
        return;
    }
    println!("\n{}:", heading);
    chat_table(chats, selected, title_width, busy).printstd();
    println!();
}

/// Readline prompt naming the selected chat
pub fn format_prompt(chat: Option<&Chat>, title_width: usize) -> String {
    match chat {
        Some(chat) if chat.archived => format!(
            "[{} {}] >> ",
            truncate_title(&chat.title, title_width).cyan(),
            "archived".yellow()
        ),
        Some(chat) => format!("[{}] >> ", truncate_title(&chat.title, title_width).cyan()),
        None => format!("[{}] >> ", "no chat".dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocalId;
    use crate::test_utils::{sample_chat, sample_message};
    use chrono::Utc;

    #[test]
    fn test_format_pending_uses_placeholder() {
        colored::control::set_override(false);
        let line = format_view_message(&ViewMessage::Pending {
            chat_id: "c1".to_string(),
        });
        assert_eq!(line, "assistant: ...");
    }

    #[test]
    fn test_format_local_and_persisted() {
        colored::control::set_override(false);
        let local = ViewMessage::Local {
            id: LocalId::next(),
            chat_id: "c1".to_string(),
            author: Author::User,
            content: "Hallo".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(format_view_message(&local), "you: Hallo (sending)");

        let persisted = ViewMessage::Persisted(sample_message("c1", "m2", "Hoi!", false));
        assert_eq!(format_view_message(&persisted), "assistant: Hoi!");
    }

    #[test]
    fn test_transcript_line_names_author() {
        let message = sample_message("c1", "m1", "Hallo", true);
        assert!(format_transcript_line(&message).ends_with("user: Hallo"));
    }

    #[test]
    fn test_chat_table_has_row_per_chat() {
        let chats = vec![sample_chat("aaaaaaaa-1", "Een", 0), sample_chat("bbbbbbbb-2", "Twee", 1)];
        let table = chat_table(&chats, Some("aaaaaaaa-1"), 12, &|_| false);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_prompt_truncates_title() {
        colored::control::set_override(false);
        let prompt = format_prompt(Some(&sample_chat("c1", "Vakantieplanning 2025", 0)), 12);
        assert_eq!(prompt, "[Vakantiep...] >> ");
        assert_eq!(format_prompt(None, 12), "[no chat] >> ");
    }
}
