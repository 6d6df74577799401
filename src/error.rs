//! Error types for Chatdesk
//!
//! This module defines the error taxonomy used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Chatdesk operations
///
/// Validation failures of a message submission are not errors: they are
/// reported as [`crate::sync::SubmitOutcome::Rejected`]. Everything that
/// reaches this enum is something a caller surfaces to the user once.
#[derive(Error, Debug)]
pub enum ChatdeskError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input rejected before any service call was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// A chat or message id did not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence Service failures (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Provider-related errors (API calls, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Completion round trip failed (provider or reply persistence)
    #[error("Completion failed: {0}")]
    Completion(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Authentication errors (e.g., 401 Unauthorized)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Chatdesk operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Callers that
/// need the variant use `err.downcast_ref::<ChatdeskError>()`.
pub type Result<T> = anyhow::Result<T>;
