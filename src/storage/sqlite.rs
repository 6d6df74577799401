use crate::error::{ChatdeskError, Result};
use crate::models::{Author, Chat, ChatPatch, Message};
use crate::storage::{new_record_id, PersistenceService};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

/// SQLite-backed Persistence Service
///
/// Every call opens its own connection on the blocking thread pool, so the
/// async callers never block the runtime on disk I/O.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Create a storage instance in the user's data directory
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "chatdesk", "chatdesk")
            .ok_or_else(|| ChatdeskError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("chat.db"))
    }

    /// Create a storage instance that uses the specified database path.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatdesk::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("chat.db")).unwrap();
    /// assert!(storage.db_path().exists());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| ChatdeskError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        tracing::debug!(path = %storage.db_path.display(), "Opened chat database");
        Ok(storage)
    }

    /// Open the configured database, or the default location when unset
    pub fn open(db_path: Option<&str>) -> Result<Self> {
        match db_path {
            Some(path) => Self::new_with_path(path),
            None => Self::new(),
        }
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = open_connection(&self.db_path)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                archived INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                chat_id TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
                is_user INTEGER NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chats_owner ON chats(owner_id, updated_at);
            CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, created_at, seq);",
        )
        .context("Failed to create tables")
        .map_err(|e| ChatdeskError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Run a database closure on the blocking pool with a fresh connection
    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = open_connection(&path)?;
            op(&mut conn)
        })
        .await
        .map_err(|e| ChatdeskError::Storage(format!("Storage task failed: {}", e)))?
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .context("Failed to open database")
        .map_err(|e| ChatdeskError::Storage(e.to_string()))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| ChatdeskError::Storage(format!("Failed to enable foreign keys: {}", e)))?;
    Ok(conn)
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        archived: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
        updated_at: parse_timestamp(row, 5)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let is_user: bool = row.get(2)?;
    Ok(Message {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        author: Author::from_is_user(is_user),
        content: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
    })
}

fn storage_err(context: &str, e: rusqlite::Error) -> anyhow::Error {
    ChatdeskError::Storage(format!("{}: {}", context, e)).into()
}

#[async_trait]
impl PersistenceService for SqliteStorage {
    async fn list_chats(&self, owner_id: &str) -> Result<Vec<Chat>> {
        let owner_id = owner_id.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, owner_id, title, archived, created_at, updated_at
                    FROM chats
                    WHERE owner_id = ?
                    ORDER BY updated_at DESC, created_at DESC",
                )
                .map_err(|e| storage_err("Failed to prepare statement", e))?;

            let chats = stmt
                .query_map(params![owner_id], chat_from_row)
                .map_err(|e| storage_err("Failed to query chats", e))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| storage_err("Failed to read chat row", e))?;

            Ok(chats)
        })
        .await
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        let chat_id = chat_id.to_string();
        self.with_connection(move |conn| {
            conn.query_row(
                "SELECT id, owner_id, title, archived, created_at, updated_at
                FROM chats WHERE id = ?",
                params![chat_id],
                chat_from_row,
            )
            .optional()
            .map_err(|e| storage_err("Failed to query chat", e))
        })
        .await
    }

    async fn create_chat(&self, owner_id: &str, title: &str) -> Result<Chat> {
        let now = Utc::now();
        let chat = Chat {
            id: new_record_id(),
            title: title.to_string(),
            owner_id: owner_id.to_string(),
            archived: false,
            created_at: now,
            updated_at: now,
        };

        let record = chat.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO chats (id, owner_id, title, archived, created_at, updated_at)
                VALUES (?, ?, ?, 0, ?, ?)",
                params![
                    record.id,
                    record.owner_id,
                    record.title,
                    format_timestamp(record.created_at),
                    format_timestamp(record.updated_at)
                ],
            )
            .map_err(|e| storage_err("Failed to insert chat", e))?;
            Ok(())
        })
        .await?;

        tracing::debug!(chat_id = %chat.id, "Created chat");
        Ok(chat)
    }

    async fn update_chat(&self, chat_id: &str, patch: &ChatPatch) -> Result<()> {
        let chat_id = chat_id.to_string();
        let patch = patch.clone();
        self.with_connection(move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| storage_err("Failed to start transaction", e))?;

            let now = format_timestamp(Utc::now());
            let changed = tx
                .execute(
                    "UPDATE chats SET updated_at = ? WHERE id = ?",
                    params![now, chat_id],
                )
                .map_err(|e| storage_err("Failed to update chat", e))?;

            if changed == 0 {
                return Err(ChatdeskError::NotFound(format!("chat {}", chat_id)).into());
            }

            if let Some(title) = &patch.title {
                tx.execute(
                    "UPDATE chats SET title = ? WHERE id = ?",
                    params![title, chat_id],
                )
                .map_err(|e| storage_err("Failed to rename chat", e))?;
            }

            if let Some(archived) = patch.archived {
                tx.execute(
                    "UPDATE chats SET archived = ? WHERE id = ?",
                    params![archived, chat_id],
                )
                .map_err(|e| storage_err("Failed to archive chat", e))?;
            }

            tx.commit()
                .map_err(|e| storage_err("Failed to commit transaction", e))?;
            Ok(())
        })
        .await
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let chat_id = chat_id.to_string();
        self.with_connection(move |conn| {
            let removed = conn
                .execute("DELETE FROM chats WHERE id = ?", params![chat_id])
                .map_err(|e| storage_err("Failed to delete chat", e))?;
            tracing::debug!(chat_id = %chat_id, removed, "Deleted chat");
            Ok(())
        })
        .await
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let chat_id = chat_id.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, chat_id, is_user, content, created_at
                    FROM messages
                    WHERE chat_id = ?
                    ORDER BY created_at ASC, seq ASC",
                )
                .map_err(|e| storage_err("Failed to prepare statement", e))?;

            let messages = stmt
                .query_map(params![chat_id], message_from_row)
                .map_err(|e| storage_err("Failed to query messages", e))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| storage_err("Failed to read message row", e))?;

            Ok(messages)
        })
        .await
    }

    async fn create_message(
        &self,
        chat_id: &str,
        content: &str,
        is_user: bool,
    ) -> Result<Message> {
        let message = Message {
            id: new_record_id(),
            chat_id: chat_id.to_string(),
            author: Author::from_is_user(is_user),
            content: content.to_string(),
            created_at: Utc::now(),
        };

        let record = message.clone();
        self.with_connection(move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| storage_err("Failed to start transaction", e))?;

            let created_at = format_timestamp(record.created_at);
            tx.execute(
                "INSERT INTO messages (id, chat_id, is_user, content, created_at)
                VALUES (?, ?, ?, ?, ?)",
                params![
                    record.id,
                    record.chat_id,
                    record.author.is_user(),
                    record.content,
                    created_at
                ],
            )
            .map_err(|e| storage_err("Failed to insert message", e))?;

            tx.execute(
                "UPDATE chats SET updated_at = ? WHERE id = ?",
                params![created_at, record.chat_id],
            )
            .map_err(|e| storage_err("Failed to touch chat", e))?;

            tx.commit()
                .map_err(|e| storage_err("Failed to commit transaction", e))?;
            Ok(())
        })
        .await?;

        Ok(message)
    }
}
