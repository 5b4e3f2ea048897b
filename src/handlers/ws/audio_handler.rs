//! Audio chunk handling
//!
//! Chunks accumulate in the connection's utterance buffer. The chunk flagged
//! `is_last` closes the utterance: an empty utterance is a no-op, otherwise a
//! new generation is minted and recognition runs on its own task so the read
//! loop stays free to receive an interrupt.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::ingest::recognize_turn;
use crate::core::mood::AnnotatedTranscript;
use crate::state::AppState;

use super::error::{WebSocketError, WebSocketResult};
use super::messages::{AudioChunkPayload, OutgoingMessage};
use super::sink::WsEventSink;
use super::state::ConnectionState;

/// Buffer one chunk and, on the last one, start recognition.
///
/// Returns the recognition task if one was started.
pub fn handle_audio_chunk(
    msg_id: String,
    payload: AudioChunkPayload,
    state: &ConnectionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    app_state: &Arc<AppState>,
) -> WebSocketResult<Option<JoinHandle<Option<AnnotatedTranscript>>>> {
    if !payload.audio_b64.is_empty() {
        let chunk = BASE64
            .decode(payload.audio_b64.as_bytes())
            .map_err(|e| WebSocketError::InvalidAudio(e.to_string()))?;
        state.with_audio(|buffer| buffer.push(Bytes::from(chunk)));
    }

    if !payload.is_last {
        return Ok(None);
    }

    let Some(audio) = state.with_audio(|buffer| buffer.take()) else {
        debug!("Utterance end with empty buffer on {}, ignoring", state.session_id);
        return Ok(None);
    };

    let guard = state.begin_generation();
    info!(
        "Utterance complete on {} ({} bytes), recognizing as {}",
        state.session_id,
        audio.len(),
        guard.generation()
    );

    let sink = Arc::new(WsEventSink::new(
        msg_id,
        guard.clone(),
        message_tx.clone(),
    ));
    let stt = app_state.core_state.stt.clone();
    Ok(Some(tokio::spawn(recognize_turn(guard, stt, audio, sink))))
}
