mod base;
pub mod http;

pub use base::{BaseTTS, BoxedTTS, TTSConfig, TTSError, TTSResult};
pub use http::HttpTTS;

use std::time::Duration;

use bytes::Bytes;

/// Factory function to create a TTS provider.
///
/// # Supported Providers
///
/// - `"http"` - Local synthesis server with a `GET ?text=&speed_factor=` endpoint
pub fn create_tts_provider(provider_type: &str, config: TTSConfig) -> TTSResult<BoxedTTS> {
    match provider_type.to_lowercase().as_str() {
        "http" => Ok(Box::new(HttpTTS::new(config)?)),
        _ => Err(TTSError::InvalidConfiguration(format!(
            "Unsupported TTS provider: {provider_type}. Supported providers: http"
        ))),
    }
}

/// Run one synthesis call under a deadline.
///
/// The call is dropped, and its request cancelled, once the deadline passes.
pub async fn synthesize_with_timeout(
    tts: &dyn BaseTTS,
    text: &str,
    speed_factor: f32,
    timeout: Duration,
) -> TTSResult<Bytes> {
    match tokio::time::timeout(timeout, tts.synthesize(text, speed_factor)).await {
        Ok(result) => result,
        Err(_) => Err(TTSError::TimeoutError(format!(
            "{} synthesis exceeded {}ms",
            tts.provider_name(),
            timeout.as_millis()
        ))),
    }
}
