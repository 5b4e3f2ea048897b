//! WebSocket message types
//!
//! Every frame in either direction is one JSON envelope
//! `{"msg_id", "type", "timestamp", "payload"}`. Incoming envelopes are decoded
//! in two steps: the envelope itself, then the payload for the declared type,
//! so an unknown type or a malformed payload never takes the connection down.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::events::{AudioFragment, TurnEvent};
use crate::core::generation::GenerationGuard;
use crate::core::llm::ChatTurn;
use crate::core::mood::MoodShift;

use super::error::{WebSocketError, WebSocketResult};

/// Message types a client may send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ClientMessageType {
    #[serde(rename = "client.auth_handshake")]
    AuthHandshake,
    #[serde(rename = "client.wake_up")]
    WakeUp,
    #[serde(rename = "client.audio_chunk")]
    AudioChunk,
    #[serde(rename = "client.text_request")]
    TextRequest,
    #[serde(rename = "client.interrupt")]
    Interrupt,
    #[serde(rename = "client.system_tick")]
    SystemTick,
    #[serde(rename = "client.embed_request")]
    EmbedRequest,
    #[serde(rename = "client.action_result")]
    ActionResult,
    /// Any type string this server does not know
    #[serde(other)]
    Unsupported,
}

/// Raw incoming envelope; the payload is decoded once the type is known
#[derive(Debug, Deserialize)]
pub struct ClientEnvelope {
    #[serde(alias = "message_id")]
    pub msg_id: String,
    #[serde(rename = "type")]
    pub kind: ClientMessageType,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuthHandshakePayload {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub client_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WakeUpPayload {
    #[serde(default)]
    pub trigger_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AudioChunkPayload {
    #[serde(default)]
    pub audio_b64: String,
    #[serde(default)]
    pub is_last: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TextRequestPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct InterruptPayload {
    #[serde(default)]
    pub reason: Option<String>,
}

/// A decoded client message
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    AuthHandshake(AuthHandshakePayload),
    WakeUp(WakeUpPayload),
    AudioChunk(AudioChunkPayload),
    TextRequest(TextRequestPayload),
    Interrupt(InterruptPayload),
    /// Known to the protocol but not acted upon by this server
    Ignored(ClientMessageType),
}

impl IncomingMessage {
    pub fn is_handshake(&self) -> bool {
        matches!(self, IncomingMessage::AuthHandshake(_))
    }
}

fn decode_payload<T: DeserializeOwned>(
    kind: ClientMessageType,
    payload: Value,
) -> WebSocketResult<T> {
    // Payload-less messages are sent as `{}` by well-behaved clients, but tolerate null.
    let payload = if payload.is_null() {
        Value::Object(Default::default())
    } else {
        payload
    };
    serde_json::from_value(payload).map_err(|e| WebSocketError::InvalidPayload {
        kind: format!("{kind:?}"),
        error: e.to_string(),
    })
}

impl ClientEnvelope {
    /// Parse one text frame into an envelope
    pub fn parse(text: &str) -> WebSocketResult<Self> {
        serde_json::from_str(text).map_err(|e| WebSocketError::InvalidMessage(e.to_string()))
    }

    /// Decode the payload for the declared type
    pub fn into_message(self) -> WebSocketResult<(String, IncomingMessage)> {
        let kind = self.kind;
        let message = match kind {
            ClientMessageType::AuthHandshake => {
                IncomingMessage::AuthHandshake(decode_payload(kind, self.payload)?)
            }
            ClientMessageType::WakeUp => IncomingMessage::WakeUp(decode_payload(kind, self.payload)?),
            ClientMessageType::AudioChunk => {
                IncomingMessage::AudioChunk(decode_payload(kind, self.payload)?)
            }
            ClientMessageType::TextRequest => {
                IncomingMessage::TextRequest(decode_payload(kind, self.payload)?)
            }
            ClientMessageType::Interrupt => {
                IncomingMessage::Interrupt(decode_payload(kind, self.payload)?)
            }
            other => IncomingMessage::Ignored(other),
        };
        Ok((self.msg_id, message))
    }
}

/// Server message bodies, tagged with their wire type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerPayload {
    #[serde(rename = "server.asr_result")]
    AsrResult { text: String, is_valid_speech: bool },
    #[serde(rename = "server.thought_stream")]
    ThoughtStream { chunk: String, is_end: bool },
    #[serde(rename = "server.tts_audio")]
    TtsAudio {
        audio_b64: String,
        sync_text: String,
        sentence_id: i32,
        is_reply_end: bool,
    },
    #[serde(rename = "server.emotion_shift")]
    EmotionShift {
        ai_mood_score: i32,
        live2d_expression: String,
        live2d_motion: String,
        vad_sensitivity: f32,
    },
    #[serde(rename = "server.error")]
    Error { message: String },
}

impl From<AudioFragment> for ServerPayload {
    fn from(fragment: AudioFragment) -> Self {
        let audio_b64 = if fragment.audio.is_empty() {
            String::new()
        } else {
            BASE64.encode(&fragment.audio)
        };
        ServerPayload::TtsAudio {
            audio_b64,
            sync_text: fragment.sync_text,
            sentence_id: fragment.sequence,
            is_reply_end: fragment.is_reply_end,
        }
    }
}

impl From<MoodShift> for ServerPayload {
    fn from(shift: MoodShift) -> Self {
        ServerPayload::EmotionShift {
            ai_mood_score: shift.mood_score,
            live2d_expression: shift.expression,
            live2d_motion: shift.motion,
            vad_sensitivity: shift.vad_sensitivity,
        }
    }
}

impl From<TurnEvent> for ServerPayload {
    fn from(event: TurnEvent) -> Self {
        match event {
            TurnEvent::Transcript {
                text,
                is_valid_speech,
            } => ServerPayload::AsrResult {
                text,
                is_valid_speech,
            },
            TurnEvent::ThoughtDelta { chunk, is_end } => {
                ServerPayload::ThoughtStream { chunk, is_end }
            }
            TurnEvent::MoodShift(shift) => shift.into(),
            TurnEvent::Audio(fragment) => fragment.into(),
            TurnEvent::Error { message } => ServerPayload::Error { message },
        }
    }
}

/// Outgoing envelope; echoes the `msg_id` of the client message that caused it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub msg_id: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub body: ServerPayload,
    /// Generation of the turn that produced this message, if any.
    #[serde(skip)]
    pub generation: Option<GenerationGuard>,
}

impl OutgoingMessage {
    pub fn new(msg_id: impl Into<String>, body: ServerPayload) -> Self {
        Self {
            msg_id: msg_id.into(),
            timestamp: now_millis(),
            body,
            generation: None,
        }
    }

    pub fn from_event(msg_id: &str, event: TurnEvent) -> Self {
        Self::new(msg_id, event.into())
    }

    /// Tie this message to a turn so it can be dropped once the turn is superseded.
    pub fn for_generation(mut self, guard: GenerationGuard) -> Self {
        self.generation = Some(guard);
        self
    }

    /// The turn that produced this message has been superseded since it was queued.
    pub fn is_stale(&self) -> bool {
        self.generation
            .as_ref()
            .is_some_and(|guard| !guard.is_current())
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
