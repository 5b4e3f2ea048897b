//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::Mutex;

use neurallink::core::events::{TurnEvent, TurnEventSink};
use neurallink::core::llm::{BaseLLM, LLMError, LLMResult, TokenStream};
use neurallink::core::stt::{BaseSTT, STTError};
use neurallink::core::tts::{BaseTTS, TTSError, TTSResult};
use neurallink::core::turn::TurnSettings;
use neurallink::core::CoreState;

/// One step of a scripted generation stream
#[derive(Debug, Clone)]
pub enum Step {
    Fragment(&'static str),
    Pause(Duration),
    Fail(&'static str),
}

/// Generation collaborator that replays a fixed script
pub struct ScriptedLLM {
    script: Vec<Step>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLLM {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn fragments(fragments: &[&'static str]) -> Self {
        Self::new(fragments.iter().copied().map(Step::Fragment).collect())
    }
}

#[async_trait]
impl BaseLLM for ScriptedLLM {
    async fn stream(&self, prompt: &str) -> LLMResult<TokenStream> {
        self.prompts.lock().push(prompt.to_string());
        let steps: VecDeque<Step> = self.script.iter().cloned().collect();

        let stream = stream::unfold(steps, |mut steps| async move {
            loop {
                match steps.pop_front()? {
                    Step::Pause(duration) => tokio::time::sleep(duration).await,
                    Step::Fragment(text) => return Some((Ok(text.to_string()), steps)),
                    Step::Fail(message) => {
                        steps.clear();
                        return Some((Err(LLMError::StreamError(message.to_string())), steps));
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Synthesis collaborator with per-text latency and failures
#[derive(Default)]
pub struct StubTTS {
    pub default_delay: Duration,
    pub delays: HashMap<String, Duration>,
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubTTS {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn called_with(&self, text: &str) -> bool {
        self.calls.lock().iter().any(|t| t == text)
    }
}

#[async_trait]
impl BaseTTS for StubTTS {
    async fn synthesize(&self, text: &str, _speed_factor: f32) -> TTSResult<Bytes> {
        self.calls.lock().push(text.to_string());
        let delay = self.delays.get(text).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(text) {
            return Err(TTSError::ProviderError(format!("cannot say {text}")));
        }
        Ok(Bytes::from(format!("audio:{text}")))
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

/// Recognition collaborator that always hears the same thing
pub struct FixedSTT(pub &'static str);

#[async_trait]
impl BaseSTT for FixedSTT {
    async fn recognize(&self, audio: Vec<u8>) -> Result<String, STTError> {
        if audio.is_empty() {
            return Err(STTError::AudioProcessingError("empty".to_string()));
        }
        Ok(self.0.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "fixed"
    }
}

/// Sink that records every event in arrival order
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<TurnEvent>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TurnEvent> {
        self.events.lock().clone()
    }

    /// Sequence numbers of every audio fragment, in arrival order
    pub fn audio_sequences(&self) -> Vec<i32> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                TurnEvent::Audio(fragment) => Some(fragment.sequence),
                _ => None,
            })
            .collect()
    }

    pub fn thought_chunks(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                TurnEvent::ThoughtDelta { chunk, is_end: false } => Some(chunk.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TurnEventSink for CollectingSink {
    async fn emit(&self, event: TurnEvent) {
        self.events.lock().push(event);
    }
}

pub fn settings() -> TurnSettings {
    TurnSettings::default()
}

pub fn core_with(llm: Arc<ScriptedLLM>, tts: Arc<StubTTS>) -> Arc<CoreState> {
    CoreState::with_providers(Arc::new(FixedSTT("你好")), tts, llm, settings())
}
