use crate::commands::{open_storage, render, resolve_chat};
use crate::config::Config;
use crate::error::Result;
use crate::storage::PersistenceService;
use colored::Colorize;

/// Handle `chatdesk history <ID>`
pub async fn handle_history(config: &Config, id: &str, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    show_history(&storage, config, id, json).await
}

/// Print the durable transcript of one chat
pub async fn show_history<P: PersistenceService + ?Sized>(
    storage: &P,
    config: &Config,
    id: &str,
    json: bool,
) -> Result<()> {
    let chat = resolve_chat(storage, &config.chat.owner_id, id, false).await?;
    let messages = storage.list_messages(&chat.id).await?;

    if json {
        let payload = serde_json::json!({
            "chat": chat,
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("\n{} ({})", chat.title.bold(), chat.id.cyan());
    if chat.archived {
        println!("{}", "archived".yellow());
    }
    if messages.is_empty() {
        println!("{}", "No messages in this chat.".yellow());
        return Ok(());
    }
    for message in &messages {
        println!("{}", render::format_transcript_line(message));
    }
    println!();

    Ok(())
}
