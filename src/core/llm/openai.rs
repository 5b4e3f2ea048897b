//! OpenAI-compatible chat completions provider.
//!
//! Works against any server exposing `/v1/chat/completions` with SSE
//! streaming (OpenAI, Ollama, vLLM, llama.cpp server).

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{error, info};

use super::base::{BaseLLM, LLMConfig, LLMError, LLMResult, TokenStream};
use super::sse::{DONE_SENTINEL, SseToken, token_stream};

pub struct OpenAiLLM {
    client: reqwest::Client,
    config: LLMConfig,
    endpoint: String,
}

impl OpenAiLLM {
    pub fn new(config: LLMConfig) -> LLMResult<Self> {
        if config.model.is_empty() {
            return Err(LLMError::InvalidConfiguration(
                "LLM model must not be empty".to_string(),
            ));
        }

        let base = config.url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        let endpoint = format!("{base}/v1/chat/completions");

        Ok(Self {
            client: reqwest::Client::new(),
            config,
            endpoint,
        })
    }
}

fn extract_delta(payload: &str) -> SseToken {
    if payload.trim() == DONE_SENTINEL {
        return SseToken::Done;
    }

    let chunk: Value = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => return SseToken::Invalid(format!("JSON parse error: {e}")),
    };

    match chunk["choices"][0]["delta"]["content"].as_str() {
        Some(content) if !content.is_empty() => SseToken::Text(content.to_owned()),
        _ => SseToken::Skip,
    }
}

#[async_trait]
impl BaseLLM for OpenAiLLM {
    async fn stream(&self, prompt: &str) -> LLMResult<TokenStream> {
        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": true,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = self.config.api_key.as_deref()
            && !api_key.is_empty()
        {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LLMError::ConnectionFailed(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!("LLM API error ({}): {}", status, error_body);
            return Err(LLMError::ProviderError(format!(
                "API error ({status}): {error_body}"
            )));
        }

        info!("Streaming completion from {} ({})", self.endpoint, self.config.model);
        Ok(token_stream(
            response.bytes_stream(),
            extract_delta,
            self.provider_name(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
