//! Gemini `streamGenerateContent` provider.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{error, info};

use super::base::{BaseLLM, LLMConfig, LLMError, LLMResult, TokenStream};
use super::sse::{SseToken, token_stream};

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiLLM {
    client: reqwest::Client,
    config: LLMConfig,
    endpoint: String,
}

impl GeminiLLM {
    pub fn new(config: LLMConfig) -> LLMResult<Self> {
        if config.model.is_empty() {
            return Err(LLMError::InvalidConfiguration(
                "LLM model must not be empty".to_string(),
            ));
        }
        if config.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(LLMError::InvalidConfiguration(
                "Gemini requires an API key".to_string(),
            ));
        }

        let base = config.url.trim_end_matches('/');
        let endpoint = format!(
            "{base}/v1beta/models/{}:streamGenerateContent",
            config.model
        );

        Ok(Self {
            client: reqwest::Client::new(),
            config,
            endpoint,
        })
    }
}

/// Concatenates `candidates[0].content.parts[*].text`.
///
/// Chunks without text, such as safety-blocked ones, are skipped.
fn extract_parts(payload: &str) -> SseToken {
    let chunk: Value = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => return SseToken::Invalid(format!("JSON parse error: {e}")),
    };

    let text: String = chunk["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        SseToken::Skip
    } else {
        SseToken::Text(text)
    }
}

#[async_trait]
impl BaseLLM for GeminiLLM {
    async fn stream(&self, prompt: &str) -> LLMResult<TokenStream> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
        });
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("alt", "sse"), ("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::ConnectionFailed(format!("Gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!("LLM API error ({}): {}", status, error_body);
            return Err(LLMError::ProviderError(format!(
                "API error ({status}): {error_body}"
            )));
        }

        info!("Streaming Gemini generation ({})", self.config.model);
        Ok(token_stream(
            response.bytes_stream(),
            extract_parts,
            self.provider_name(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}
