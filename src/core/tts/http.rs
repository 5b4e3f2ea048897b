//! # HTTP TTS Implementation
//!
//! Talks to a local speech synthesis server exposing
//! `GET <url>?text=<sentence>&speed_factor=<f>` and returning encoded audio.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, error};

use super::base::{BaseTTS, TTSConfig, TTSError, TTSResult};

pub struct HttpTTS {
    client: reqwest::Client,
    config: TTSConfig,
}

impl HttpTTS {
    pub fn new(config: TTSConfig) -> TTSResult<Self> {
        if config.url.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "TTS URL must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| TTSError::InvalidConfiguration(format!("Failed to build client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl BaseTTS for HttpTTS {
    async fn synthesize(&self, text: &str, speed_factor: f32) -> TTSResult<Bytes> {
        if text.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        let speed = speed_factor.to_string();
        let response = self
            .client
            .get(&self.config.url)
            .query(&[("text", text), ("speed_factor", speed.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TTSError::TimeoutError(e.to_string())
                } else if e.is_connect() {
                    TTSError::ConnectionFailed(e.to_string())
                } else {
                    TTSError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("TTS API error ({}): {}", status, error_body);
            return Err(TTSError::ProviderError(format!(
                "API error ({status}): {error_body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TTSError::AudioGenerationFailed(e.to_string()))?;

        debug!("Synthesized {} bytes for: {}", audio.len(), text);
        Ok(audio)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> TTSConfig {
        TTSConfig {
            url: format!("{}/tts", server.uri()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_synthesize_sends_text_and_speed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tts"))
            .and(query_param("text", "你好呀！"))
            .and(query_param("speed_factor", "1.2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFdata".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let tts = HttpTTS::new(config_for(&server)).unwrap();
        let audio = tts.synthesize("你好呀！", 1.2).await.unwrap();
        assert_eq!(&audio[..], b"RIFFdata");
    }

    #[tokio::test]
    async fn test_non_success_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let tts = HttpTTS::new(config_for(&server)).unwrap();
        let err = tts.synthesize("hello", 1.0).await.unwrap_err();
        assert!(matches!(err, TTSError::ProviderError(msg) if msg.contains("boom")));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let tts = HttpTTS::new(TTSConfig::default()).unwrap();
        let err = tts.synthesize("   ", 1.0).await.unwrap_err();
        assert!(matches!(err, TTSError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let config = TTSConfig {
            url: String::new(),
            ..Default::default()
        };
        assert!(HttpTTS::new(config).is_err());
    }
}
