//! One-shot chat list commands
//!
//! These are direct pass-through calls to the Persistence Service; titles
//! go through the same validation as the interactive session.

use crate::cli::ChatsCommand;
use crate::commands::{open_storage, render, resolve_chat};
use crate::config::Config;
use crate::error::Result;
use crate::models::{Chat, ChatPatch};
use crate::storage::PersistenceService;
use crate::sync::validate_title;
use colored::Colorize;

/// Handle `chatdesk chats ...`
pub async fn handle_chats(config: &Config, command: ChatsCommand) -> Result<()> {
    let storage = open_storage(config)?;
    run_chats_command(&storage, config, command).await
}

/// Execute a chats command against any Persistence Service
pub async fn run_chats_command<P: PersistenceService + ?Sized>(
    storage: &P,
    config: &Config,
    command: ChatsCommand,
) -> Result<()> {
    let owner = config.chat.owner_id.as_str();

    match command {
        ChatsCommand::List { archived, json } => {
            let chats: Vec<Chat> = storage
                .list_chats(owner)
                .await?
                .into_iter()
                .filter(|c| c.archived == archived)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&chats)?);
                return Ok(());
            }

            let heading = if archived { "Archived chats" } else { "Chats" };
            render::print_chat_list(heading, &chats, None, config.chat.sidebar_width, &|_| false);
            if !chats.is_empty() {
                println!(
                    "Use {} to continue a chat.",
                    "chatdesk chat --chat <ID>".cyan()
                );
            }
        }
        ChatsCommand::New { title } => {
            let title = match title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                Some(title) => validate_title(title, config.chat.max_title_length)?,
                None => config.chat.default_title.clone(),
            };
            let chat = storage.create_chat(owner, &title).await?;
            tracing::info!(chat_id = %chat.id, "Created chat");
            println!("{} {} ({})", "Created chat".green(), chat.title, chat.id.cyan());
        }
        ChatsCommand::Rename { id, title } => {
            let title = validate_title(&title, config.chat.max_title_length)?;
            let chat = resolve_chat(storage, owner, &id, false).await?;
            storage
                .update_chat(&chat.id, &ChatPatch::title(title.clone()))
                .await?;
            println!("{}", format!("Renamed '{}' to '{}'", chat.title, title).green());
        }
        ChatsCommand::Archive { id } => {
            let chat = resolve_chat(storage, owner, &id, false).await?;
            storage.update_chat(&chat.id, &ChatPatch::archived(true)).await?;
            println!("{}", format!("Archived '{}'", chat.title).green());
        }
        ChatsCommand::Unarchive { id } => {
            let chat = resolve_chat(storage, owner, &id, true).await?;
            storage
                .update_chat(&chat.id, &ChatPatch::archived(false))
                .await?;
            println!("{}", format!("Restored '{}'", chat.title).green());
        }
        ChatsCommand::Delete { id } => {
            let chat = resolve_chat(storage, owner, &id, false).await?;
            storage.delete_chat(&chat.id).await?;
            println!("{}", format!("Deleted '{}'", chat.title).green());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatdeskError;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_new_uses_default_title() {
        let storage = MemoryStorage::new();
        let config = Config::default();
        run_chats_command(&storage, &config, ChatsCommand::New { title: None })
            .await
            .unwrap();

        let chats = storage.list_chats("local").await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].title, "New chat");
    }

    #[tokio::test]
    async fn test_rename_by_prefix_and_archive() {
        let storage = MemoryStorage::new();
        let config = Config::default();
        let chat = storage.create_chat("local", "Oud").await.unwrap();
        let prefix: String = chat.id.chars().take(8).collect();

        run_chats_command(
            &storage,
            &config,
            ChatsCommand::Rename {
                id: prefix.clone(),
                title: "Nieuw".to_string(),
            },
        )
        .await
        .unwrap();
        run_chats_command(&storage, &config, ChatsCommand::Archive { id: prefix })
            .await
            .unwrap();

        let stored = storage.get_chat(&chat.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Nieuw");
        assert!(stored.archived);
    }

    #[tokio::test]
    async fn test_rename_too_long_is_validation_error() {
        let storage = MemoryStorage::new();
        let config = Config::default();
        let chat = storage.create_chat("local", "Oud").await.unwrap();

        let err = run_chats_command(
            &storage,
            &config,
            ChatsCommand::Rename {
                id: chat.id.clone(),
                title: "Vijftien tekens".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatdeskError>(),
            Some(ChatdeskError::Validation(_))
        ));
        assert_eq!(storage.get_chat(&chat.id).await.unwrap().unwrap().title, "Oud");
    }

    #[tokio::test]
    async fn test_delete_unknown_chat_is_not_found() {
        let storage = MemoryStorage::new();
        let err = run_chats_command(
            &storage,
            &Config::default(),
            ChatsCommand::Delete {
                id: "does-not-exist".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatdeskError>(),
            Some(ChatdeskError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unarchive_by_archived_list_position() {
        let storage = MemoryStorage::new();
        let config = Config::default();
        let active = storage.create_chat("local", "Actief").await.unwrap();
        let archived = storage.create_chat("local", "Archief").await.unwrap();
        storage
            .update_chat(&archived.id, &ChatPatch::archived(true))
            .await
            .unwrap();

        run_chats_command(
            &storage,
            &config,
            ChatsCommand::Unarchive {
                id: "1".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(!storage.get_chat(&archived.id).await.unwrap().unwrap().archived);
        assert!(!storage.get_chat(&active.id).await.unwrap().unwrap().archived);
    }
}
