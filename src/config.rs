//! Configuration management for Chatdesk
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatdeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Models the relay accepts; mirrors the choices offered to users
pub const SUPPORTED_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o"];

/// Main configuration structure for Chatdesk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Completion relay configuration
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Chat list and session behavior
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Completion relay configuration
///
/// Settings for the hosted chat-completions endpoint the relay forwards
/// user messages to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL for the chat-completions API (useful for tests and local mocks)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key; when unset the `OPENAI_API_KEY` environment variable is used
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on reply tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// System prompt sent ahead of every user message
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// HTTP timeout for a single completion (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    150
}

fn default_system_prompt() -> String {
    "Je bent een behulpzame assistent die korte en beknopte antwoorden geeft in het Nederlands. \
     Wees direct en to-the-point."
        .to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Explicit database path; defaults to the platform data directory
    #[serde(default)]
    pub db_path: Option<String>,
}

/// Chat list and session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Owner reference used for listing and creating chats
    #[serde(default = "default_owner_id")]
    pub owner_id: String,

    /// Title given to chats created without one
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Maximum title length in characters, enforced on create and rename
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,

    /// Width titles are truncated to in chat listings
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: usize,
}

fn default_owner_id() -> String {
    "local".to_string()
}

fn default_title() -> String {
    "New chat".to_string()
}

fn default_max_title_length() -> usize {
    12
}

fn default_sidebar_width() -> usize {
    24
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            owner_id: default_owner_id(),
            default_title: default_title(),
            max_title_length: default_max_title_length(),
            sidebar_width: default_sidebar_width(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatdeskError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatdeskError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(model) = std::env::var("CHATDESK_MODEL") {
            self.completion.model = model;
        }

        if let Ok(api_base) = std::env::var("CHATDESK_API_BASE") {
            self.completion.api_base = api_base;
        }

        if let Ok(api_key) = std::env::var("CHATDESK_API_KEY") {
            self.completion.api_key = Some(api_key);
        }

        if let Ok(owner) = std::env::var("CHATDESK_OWNER_ID") {
            self.chat.owner_id = owner;
        }

        if let Ok(limit) = std::env::var("CHATDESK_MAX_TITLE_LENGTH") {
            if let Ok(value) = limit.parse() {
                self.chat.max_title_length = value;
            } else {
                tracing::warn!("Invalid CHATDESK_MAX_TITLE_LENGTH: {}", limit);
            }
        }

        if let Ok(db_path) = std::env::var("CHATDESK_DB") {
            tracing::debug!(db_path = %db_path, "Env override: CHATDESK_DB");
            self.storage.db_path = Some(db_path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db_path) = &cli.storage_path {
            self.storage.db_path = Some(db_path.clone());
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Resolve the API key from config or the `OPENAI_API_KEY` variable
    pub fn api_key(&self) -> Option<String> {
        self.completion
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_MODELS.contains(&self.completion.model.as_str()) {
            return Err(ChatdeskError::Config(format!(
                "Invalid model: {}. Must be one of: {}",
                self.completion.model,
                SUPPORTED_MODELS.join(", ")
            ))
            .into());
        }

        if self.completion.api_base.trim().is_empty() {
            return Err(
                ChatdeskError::Config("completion.api_base cannot be empty".to_string()).into(),
            );
        }

        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ChatdeskError::Config(
                "completion.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.completion.max_tokens == 0 {
            return Err(ChatdeskError::Config(
                "completion.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.completion.timeout_seconds == 0 {
            return Err(ChatdeskError::Config(
                "completion.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.owner_id.trim().is_empty() {
            return Err(ChatdeskError::Config("chat.owner_id cannot be empty".to_string()).into());
        }

        if self.chat.max_title_length == 0 {
            return Err(ChatdeskError::Config(
                "chat.max_title_length must be greater than 0".to_string(),
            )
            .into());
        }

        let default_len = self.chat.default_title.trim().chars().count();
        if default_len == 0 || default_len > self.chat.max_title_length {
            return Err(ChatdeskError::Config(format!(
                "chat.default_title must be 1 to {} characters",
                self.chat.max_title_length
            ))
            .into());
        }

        if self.chat.sidebar_width < 4 {
            return Err(ChatdeskError::Config(
                "chat.sidebar_width must be at least 4".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
