//! # TTS Base Trait
//!
//! Unified interface for Text-to-Speech collaborators. A provider turns one
//! sentence into one opaque audio payload; ordering, timeouts and staleness
//! checks are handled by the caller.

use async_trait::async_trait;
use bytes::Bytes;

/// TTS-specific error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum TTSError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),
}

/// Result type for TTS operations
pub type TTSResult<T> = Result<T, TTSError>;

/// Configuration for TTS providers
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct TTSConfig {
    pub provider: String,
    /// Synthesis endpoint
    pub url: String,
    /// Upper bound on the HTTP request itself, in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            provider: "http".to_string(),
            url: "http://127.0.0.1:9880/tts".to_string(),
            request_timeout_ms: 15_000,
        }
    }
}

/// Base trait for Text-to-Speech providers
#[async_trait]
pub trait BaseTTS: Send + Sync {
    /// Synthesize one sentence
    ///
    /// # Arguments
    /// * `text` - Sentence text with speed tags already removed
    /// * `speed_factor` - Speaking rate, 1.0 is normal
    ///
    /// # Returns
    /// * `TTSResult<Bytes>` - Encoded audio or error
    async fn synthesize(&self, text: &str, speed_factor: f32) -> TTSResult<Bytes>;

    /// Get provider name for logging
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shareable TTS provider
pub type BoxedTTS = Box<dyn BaseTTS>;
