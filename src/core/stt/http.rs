//! HTTP recognizer client.
//!
//! Posts the utterance as `application/octet-stream` to the configured URL
//! with a `language` query parameter. The server answers either with a single
//! `{"text": ...}` object or with a list of them, in which case the first
//! entry wins.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, error};

use super::base::{BaseSTT, STTConfig, STTError};

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecognitionResponse {
    Single(Segment),
    Batch(Vec<Segment>),
}

impl RecognitionResponse {
    fn into_text(self) -> String {
        match self {
            Self::Single(segment) => segment.text,
            Self::Batch(segments) => segments
                .into_iter()
                .next()
                .map(|segment| segment.text)
                .unwrap_or_default(),
        }
    }
}

pub struct HttpSTT {
    client: reqwest::Client,
    config: STTConfig,
}

impl HttpSTT {
    pub fn new(config: STTConfig) -> Result<Self, STTError> {
        if config.url.is_empty() {
            return Err(STTError::ConfigurationError(
                "STT URL must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| STTError::ConfigurationError(format!("Failed to build client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl BaseSTT for HttpSTT {
    async fn recognize(&self, audio: Vec<u8>) -> Result<String, STTError> {
        if audio.is_empty() {
            return Err(STTError::AudioProcessingError(
                "No audio to recognize".to_string(),
            ));
        }

        let size = audio.len();
        let response = self
            .client
            .post(&self.config.url)
            .query(&[("language", self.config.language.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    STTError::ConnectionFailed(e.to_string())
                } else {
                    STTError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("STT API error ({}): {}", status, error_body);
            return Err(STTError::ProviderError(format!(
                "API error ({status}): {error_body}"
            )));
        }

        let parsed: RecognitionResponse = response
            .json()
            .await
            .map_err(|e| STTError::ProviderError(format!("Invalid recognition response: {e}")))?;

        let text = parsed.into_text();
        debug!("Recognized {} bytes of audio: {}", size, text);
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_bytes, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> STTConfig {
        STTConfig {
            url: format!("{}/asr", server.uri()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_recognize_single_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/asr"))
            .and(query_param("language", "zh"))
            .and(header("content-type", "application/octet-stream"))
            .and(body_bytes(vec![1u8, 2, 3, 4]))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "<|zh|><|HAPPY|>你好"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stt = HttpSTT::new(config_for(&server)).unwrap();
        let text = stt.recognize(vec![1, 2, 3, 4]).await.unwrap();
        assert_eq!(text, "<|zh|><|HAPPY|>你好");
    }

    #[tokio::test]
    async fn test_recognize_list_takes_first_entry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"text": "first", "key": "a"},
                {"text": "second", "key": "b"}
            ])))
            .mount(&server)
            .await;

        let stt = HttpSTT::new(config_for(&server)).unwrap();
        assert_eq!(stt.recognize(vec![0u8; 16]).await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_server_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
            .mount(&server)
            .await;

        let stt = HttpSTT::new(config_for(&server)).unwrap();
        let err = stt.recognize(vec![0u8; 16]).await.unwrap_err();
        assert!(matches!(err, STTError::ProviderError(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_empty_audio_is_rejected() {
        let stt = HttpSTT::new(STTConfig::default()).unwrap();
        assert!(matches!(
            stt.recognize(Vec::new()).await,
            Err(STTError::AudioProcessingError(_))
        ));
    }
}
