//! Provider module for Chatdesk
//!
//! This module contains the completion provider abstraction and the
//! OpenAI-compatible implementation used by the relay.

pub mod base;
pub mod openai;

pub use base::{CompletionResponse, Message, Provider, TokenUsage};
pub use openai::OpenAiProvider;

use crate::config::Config;
use crate::error::{ChatdeskError, Result};

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns `MissingCredentials` if no API key is configured, or an error if
/// the HTTP client cannot be initialized
pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    let api_key = config
        .api_key()
        .ok_or_else(|| ChatdeskError::MissingCredentials("openai".to_string()))?;
    Ok(Box::new(OpenAiProvider::new(
        config.completion.clone(),
        api_key,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompletionConfig;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_create_provider_without_key_fails() {
        std::env::remove_var("OPENAI_API_KEY");
        let config = Config::default();
        let err = create_provider(&config).err().expect("missing key must fail");
        assert!(matches!(
            err.downcast_ref::<ChatdeskError>(),
            Some(ChatdeskError::MissingCredentials(_))
        ));
    }

    #[test]
    #[serial]
    fn test_create_provider_with_configured_key() {
        let config = Config {
            completion: CompletionConfig {
                api_key: Some("sk-config".to_string()),
                ..CompletionConfig::default()
            },
            ..Config::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.get_current_model().unwrap(), "gpt-4o-mini");
    }
}
