//! Test utilities for Chatdesk
//!
//! Temporary directories, fixture builders for chats and messages, and
//! assertion helpers shared by the unit tests.

use crate::error::ChatdeskError;
use crate::models::{Author, Chat, Message};
use chrono::{Duration, Utc};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Build a chat owned by `anna`, last updated `age_minutes` ago
pub fn sample_chat(id: &str, title: &str, age_minutes: i64) -> Chat {
    let at = Utc::now() - Duration::minutes(age_minutes);
    Chat {
        id: id.to_string(),
        title: title.to_string(),
        owner_id: "anna".to_string(),
        archived: false,
        created_at: at,
        updated_at: at,
    }
}

/// Build a persisted message
pub fn sample_message(chat_id: &str, id: &str, content: &str, is_user: bool) -> Message {
    Message {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        author: Author::from_is_user(is_user),
        content: content.to_string(),
        created_at: Utc::now(),
    }
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: anyhow::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Borrow the `ChatdeskError` inside an `anyhow::Error`
///
/// # Panics
///
/// Panics if the error is not a `ChatdeskError`
pub fn chatdesk_error(error: &anyhow::Error) -> &ChatdeskError {
    error
        .downcast_ref::<ChatdeskError>()
        .unwrap_or_else(|| panic!("expected ChatdeskError, got: {}", error))
}

/// Configuration YAML exercising every section
pub fn test_config_yaml() -> String {
    r#"
completion:
  api_base: http://localhost:8080/v1
  model: gpt-4o
  temperature: 0.2
  max_tokens: 400
storage:
  db_path: /tmp/chatdesk.db
chat:
  owner_id: anna
  default_title: Nieuw
  max_title_length: 10
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: anyhow::Result<()> =
            Err(ChatdeskError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    #[should_panic(expected = "expected ChatdeskError")]
    fn test_chatdesk_error_rejects_foreign_errors() {
        let error = anyhow::anyhow!("plain");
        chatdesk_error(&error);
    }

    #[test]
    fn test_sample_fixtures() {
        let chat = sample_chat("c1", "Recepten", 5);
        assert!(chat.updated_at < Utc::now());
        assert!(sample_message("c1", "m1", "Hallo", true).is_user());
    }
}
