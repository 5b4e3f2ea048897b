//! Utterance ingestion: buffering of client audio and recognition.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::{debug, error, info};

use super::audio::normalize_utterance;
use super::events::{TurnEvent, TurnEventSink};
use super::generation::GenerationGuard;
use super::mood::AnnotatedTranscript;
use super::stt::{BaseSTT, STTError};

/// Per-connection buffer of audio chunks for the utterance in progress.
#[derive(Debug, Default)]
pub struct AudioIngestBuffer {
    audio: BytesMut,
    chunks: usize,
}

impl AudioIngestBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Bytes) {
        self.audio.extend_from_slice(&chunk);
        self.chunks += 1;
    }

    /// Take the whole utterance, leaving the buffer empty.
    ///
    /// Returns `None` when nothing was buffered.
    pub fn take(&mut self) -> Option<Vec<u8>> {
        let chunks = std::mem::take(&mut self.chunks);
        if self.audio.is_empty() {
            return None;
        }
        debug!("Submitting utterance of {} bytes in {} chunks", self.audio.len(), chunks);
        Some(self.audio.split().to_vec())
    }

    pub fn len(&self) -> usize {
        self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Normalize the utterance off the async runtime.
async fn prepare_audio(audio: Vec<u8>) -> Result<Vec<u8>, STTError> {
    tokio::task::spawn_blocking(move || normalize_utterance(&audio))
        .await
        .map_err(|e| STTError::AudioProcessingError(format!("Audio task failed: {e}")))?
}

/// Recognize one utterance and report the transcript if still current.
///
/// Returns the annotated transcript that was emitted, if any. Audio that
/// cannot be normalized is logged and dropped without a transcript.
pub async fn recognize_turn(
    guard: GenerationGuard,
    stt: Arc<dyn BaseSTT>,
    audio: Vec<u8>,
    sink: Arc<dyn TurnEventSink>,
) -> Option<AnnotatedTranscript> {
    let audio = match prepare_audio(audio).await {
        Ok(audio) => audio,
        Err(e) => {
            error!("Rejected utterance: {}", e);
            return None;
        }
    };

    let raw = match stt.recognize(audio).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Recognition failed ({}): {}", stt.provider_name(), e);
            return None;
        }
    };

    if !guard.is_current() {
        debug!("Discarding stale transcript for {}", guard.generation());
        return None;
    }

    let transcript = AnnotatedTranscript::parse(&raw);
    info!("Recognized: {}", transcript.display_text());
    sink.emit(TurnEvent::Transcript {
        text: transcript.display_text(),
        is_valid_speech: transcript.is_valid_speech(),
    })
    .await;

    Some(transcript)
}
