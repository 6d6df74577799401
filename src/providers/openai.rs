//! OpenAI-compatible chat-completions provider
//!
//! Sends a single non-streaming request per completion to
//! `{api_base}/chat/completions` with bearer authentication.

use crate::config::CompletionConfig;
use crate::error::{ChatdeskError, Result};
use crate::providers::{CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat-completions API provider
///
/// # Examples
///
/// ```no_run
/// use chatdesk::config::CompletionConfig;
/// use chatdesk::providers::{OpenAiProvider, Provider, Message};
///
/// # async fn example() -> chatdesk::error::Result<()> {
/// let provider = OpenAiProvider::new(CompletionConfig::default(), "sk-test".to_string())?;
/// let completion = provider.complete(&[Message::user("Hallo")]).await?;
/// println!("{:?}", completion.message.content);
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    client: Client,
    config: CompletionConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

impl OpenAiProvider {
    /// Create a new provider
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` for an empty key, or a provider error if
    /// the HTTP client cannot be built
    pub fn new(config: CompletionConfig, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ChatdeskError::MissingCredentials("openai".to_string()).into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("chatdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatdeskError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized completion provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Endpoint that completions are posted to
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    /// Configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[Message]) -> Result<CompletionResponse> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        tracing::debug!(
            "Sending completion request: {} messages, model={}",
            messages.len(),
            self.config.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request failed: {}", e);
                ChatdeskError::Provider(format!("Completion request failed: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::error!("Completion API rejected credentials");
            return Err(ChatdeskError::Authentication(
                "completion API returned 401 Unauthorized".to_string(),
            )
            .into());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Completion API returned error {}: {}", status, error_text);
            return Err(ChatdeskError::Provider(format!(
                "Completion API returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse completion response: {}", e);
            ChatdeskError::Provider(format!("Failed to parse completion response: {}", e))
        })?;

        let message = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ChatdeskError::Provider("Completion response had no choices".into()))?;

        let response = match body.usage {
            Some(usage) => CompletionResponse::with_usage(
                message,
                TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
            ),
            None => CompletionResponse::new(message),
        };

        if let Some(usage) = response.usage {
            tracing::debug!(
                "Completion usage: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        Ok(response)
    }

    fn get_current_model(&self) -> Result<String> {
        Ok(self.config.model.clone())
    }
}
