use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

/// LLM-specific error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    /// A single streamed event could not be decoded; the stream continues.
    #[error("Invalid chunk: {0}")]
    InvalidChunk(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl LLMError {
    /// Whether the stream can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LLMError::InvalidChunk(_))
    }
}

/// Result type for LLM operations
pub type LLMResult<T> = Result<T, LLMError>;

/// Lazy, finite, non-restartable sequence of text fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = LLMResult<String>> + Send>>;

/// Configuration for LLM providers
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct LLMConfig {
    pub provider: String,
    /// Base URL of the API, without the versioned path
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            url: "http://127.0.0.1:11434".to_string(),
            model: "qwen2.5:7b".to_string(),
            api_key: None,
        }
    }
}

/// Base trait for streaming text-generation providers
#[async_trait]
pub trait BaseLLM: Send + Sync {
    /// Start a generation for a fully rendered prompt
    ///
    /// # Arguments
    /// * `prompt` - Prompt text, see [`super::prompt::build_prompt`]
    ///
    /// # Returns
    /// * `LLMResult<TokenStream>` - Fragment stream, or an error if the request failed to start
    async fn stream(&self, prompt: &str) -> LLMResult<TokenStream>;

    /// Get provider name for logging
    fn provider_name(&self) -> &'static str;
}
