/// Configuration for STT providers
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct STTConfig {
    pub provider: String,
    /// Recognition endpoint
    pub url: String,
    /// Language hint passed to the recognizer (e.g., "zh", "en")
    pub language: String,
    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl Default for STTConfig {
    fn default() -> Self {
        Self {
            provider: "http".to_string(),
            url: "http://127.0.0.1:9870/asr".to_string(),
            language: "zh".to_string(),
            request_timeout: 30,
        }
    }
}

/// Error types for STT operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum STTError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Base trait for Speech-to-Text providers
///
/// Recognition is utterance based: the client streams audio for a whole
/// utterance and the accumulated buffer is submitted once.
#[async_trait::async_trait]
pub trait BaseSTT: Send + Sync {
    /// Recognize one utterance
    ///
    /// # Arguments
    /// * `audio` - Raw audio bytes as sent by the client
    ///
    /// # Returns
    /// * `Result<String, STTError>` - Raw transcript, possibly carrying `<|TAG|>` markup
    async fn recognize(&self, audio: Vec<u8>) -> Result<String, STTError>;

    /// Get provider name for logging
    fn provider_name(&self) -> &'static str;
}
