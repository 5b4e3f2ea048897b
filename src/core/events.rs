//! Events produced by a turn and the seam they leave the core through.

use async_trait::async_trait;
use bytes::Bytes;

use super::mood::MoodShift;

/// Sequence number carried by the latency-masking filler.
pub const FILLER_SEQUENCE: i32 = 0;
/// Sequence number carried by the end-of-reply marker.
pub const END_OF_REPLY_SEQUENCE: i32 = -1;

/// One synthesized audio fragment, or one of the two control fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFragment {
    /// `0` for the filler, `1..` for sentences, `-1` for the end marker.
    pub sequence: i32,
    pub audio: Bytes,
    pub sync_text: String,
    pub is_reply_end: bool,
}

impl AudioFragment {
    pub fn sentence(sequence: u32, audio: Bytes, sync_text: impl Into<String>) -> Self {
        Self {
            sequence: i32::try_from(sequence).unwrap_or(i32::MAX),
            audio,
            sync_text: sync_text.into(),
            is_reply_end: false,
        }
    }

    pub fn filler(audio: Bytes, phrase: impl Into<String>) -> Self {
        Self {
            sequence: FILLER_SEQUENCE,
            audio,
            sync_text: phrase.into(),
            is_reply_end: false,
        }
    }

    pub fn end_of_reply() -> Self {
        Self {
            sequence: END_OF_REPLY_SEQUENCE,
            audio: Bytes::new(),
            sync_text: String::new(),
            is_reply_end: true,
        }
    }
}

/// Everything a turn can tell the client.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Transcript { text: String, is_valid_speech: bool },
    ThoughtDelta { chunk: String, is_end: bool },
    MoodShift(MoodShift),
    Audio(AudioFragment),
    Error { message: String },
}

/// Receiver of turn events, implemented by the transport layer.
///
/// Implementations must not block; ordering of calls is ordering on the wire.
#[async_trait]
pub trait TurnEventSink: Send + Sync {
    async fn emit(&self, event: TurnEvent);
}
