//! Client-side chat list
//!
//! Holds the chats of one owner as last listed by the Persistence Service
//! and applies create, rename, archive and delete locally once the service
//! has confirmed them.

use crate::error::{ChatdeskError, Result};
use crate::models::Chat;

/// Minimum length of an id prefix accepted by [`Sidebar::resolve`]
pub const ID_PREFIX_LEN: usize = 8;

/// Ordered chat list, most recently updated first
#[derive(Debug, Default, Clone)]
pub struct Sidebar {
    chats: Vec<Chat>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with a fresh listing
    pub fn replace(&mut self, mut chats: Vec<Chat>) {
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.chats = chats;
    }

    /// Chats shown in one of the two sidebar views
    pub fn visible(&self, archived: bool) -> Vec<&Chat> {
        self.chats.iter().filter(|c| c.archived == archived).collect()
    }

    pub fn get(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    /// Put a newly created chat at the top
    pub fn insert(&mut self, chat: Chat) {
        self.chats.retain(|c| c.id != chat.id);
        self.chats.insert(0, chat);
    }

    pub fn rename(&mut self, chat_id: &str, title: &str) {
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) {
            chat.title = title.to_string();
        }
    }

    pub fn set_archived(&mut self, chat_id: &str, archived: bool) {
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) {
            chat.archived = archived;
        }
    }

    pub fn remove(&mut self, chat_id: &str) -> Option<Chat> {
        let index = self.chats.iter().position(|c| c.id == chat_id)?;
        Some(self.chats.remove(index))
    }

    /// Move a chat to the top after it received a message
    pub fn touch(&mut self, chat_id: &str, at: chrono::DateTime<chrono::Utc>) {
        if let Some(index) = self.chats.iter().position(|c| c.id == chat_id) {
            let mut chat = self.chats.remove(index);
            chat.updated_at = at;
            self.chats.insert(0, chat);
        }
    }

    /// Find a chat by full id, 1-based position in a view, or unique id prefix
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when nothing matches and `Validation` when a
    /// prefix matches more than one chat.
    pub fn resolve(&self, query: &str, archived: bool) -> Result<&Chat> {
        let query = query.trim();
        if let Some(chat) = self.get(query) {
            return Ok(chat);
        }

        if let Ok(position) = query.parse::<usize>() {
            let visible = self.visible(archived);
            if let Some(chat) = position.checked_sub(1).and_then(|i| visible.get(i)) {
                return Ok(chat);
            }
        }

        if query.len() >= ID_PREFIX_LEN {
            let matches: Vec<&Chat> = self
                .chats
                .iter()
                .filter(|c| c.id.starts_with(query))
                .collect();
            match matches.as_slice() {
                [chat] => return Ok(chat),
                [] => {}
                _ => {
                    return Err(ChatdeskError::Validation(format!(
                        "id prefix '{}' matches {} chats",
                        query,
                        matches.len()
                    ))
                    .into())
                }
            }
        }

        Err(ChatdeskError::NotFound(format!("chat {}", query)).into())
    }
}

/// Validate a title for rename, returning the trimmed text
///
/// # Errors
///
/// Returns `Validation` if the trimmed title is empty or longer than
/// `max_len` characters.
///
/// # Examples
///
/// ```
/// use chatdesk::sync::validate_title;
///
/// assert_eq!(validate_title("  Recepten ", 12).unwrap(), "Recepten");
/// assert!(validate_title("Vijftien tekens", 12).is_err());
/// ```
pub fn validate_title(title: &str, max_len: usize) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ChatdeskError::Validation("title cannot be empty".to_string()).into());
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(ChatdeskError::Validation(format!(
            "title is {} characters, the limit is {}",
            len, max_len
        ))
        .into());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_chat;
    use chrono::Utc;

    fn chat(id: &str, title: &str, archived: bool, age_minutes: i64) -> Chat {
        Chat {
            archived,
            ..sample_chat(id, title, age_minutes)
        }
    }

    fn sample() -> Sidebar {
        let mut sidebar = Sidebar::new();
        sidebar.replace(vec![
            chat("aaaaaaaa-1111", "Oud", false, 30),
            chat("bbbbbbbb-2222", "Nieuw", false, 1),
            chat("cccccccc-3333", "Archief", true, 10),
        ]);
        sidebar
    }

    #[test]
    fn test_replace_orders_most_recent_first() {
        let sidebar = sample();
        let titles: Vec<&str> = sidebar.chats.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Nieuw", "Archief", "Oud"]);
    }

    #[test]
    fn test_visible_splits_active_and_archived() {
        let sidebar = sample();
        assert_eq!(sidebar.visible(false).len(), 2);
        assert_eq!(sidebar.visible(true)[0].title, "Archief");
    }

    #[test]
    fn test_local_mutations() {
        let mut sidebar = sample();
        sidebar.insert(chat("dddddddd-4444", "Vers", false, 0));
        assert_eq!(sidebar.chats[0].title, "Vers");

        sidebar.rename("aaaaaaaa-1111", "Hernoemd");
        assert_eq!(sidebar.get("aaaaaaaa-1111").unwrap().title, "Hernoemd");

        sidebar.set_archived("aaaaaaaa-1111", true);
        assert_eq!(sidebar.visible(true).len(), 2);

        assert!(sidebar.remove("aaaaaaaa-1111").is_some());
        assert!(sidebar.get("aaaaaaaa-1111").is_none());
        assert!(sidebar.remove("aaaaaaaa-1111").is_none());
    }

    #[test]
    fn test_touch_moves_chat_to_top() {
        let mut sidebar = sample();
        sidebar.touch("aaaaaaaa-1111", Utc::now());
        assert_eq!(sidebar.chats[0].id, "aaaaaaaa-1111");
    }

    #[test]
    fn test_resolve_by_id_position_and_prefix() {
        let sidebar = sample();
        assert_eq!(sidebar.resolve("bbbbbbbb-2222", false).unwrap().title, "Nieuw");
        assert_eq!(sidebar.resolve("2", false).unwrap().title, "Oud");
        assert_eq!(sidebar.resolve("1", true).unwrap().title, "Archief");
        assert_eq!(sidebar.resolve("cccccccc", false).unwrap().title, "Archief");
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        let sidebar = sample();
        for query in ["9", "0", "zzzzzzzz", "abc"] {
            let err = sidebar.resolve(query, false).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<ChatdeskError>(), Some(ChatdeskError::NotFound(_))),
                "query {} should not resolve",
                query
            );
        }
    }

    #[test]
    fn test_resolve_ambiguous_prefix() {
        let mut sidebar = Sidebar::new();
        sidebar.replace(vec![
            chat("abcdefgh-1", "Een", false, 1),
            chat("abcdefgh-2", "Twee", false, 2),
        ]);
        let err = sidebar.resolve("abcdefgh", false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatdeskError>(),
            Some(ChatdeskError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title(" Werk ", 12).unwrap(), "Werk");
        assert!(validate_title("   ", 12).is_err());
        assert!(validate_title("Vijftien tekens", 12).is_err());
        assert!(validate_title("Twaalf tekns", 12).is_ok());
        assert!(validate_title("ééééééééééé", 12).is_ok());
    }
}
