//! # WebSocket Conversation Handler Module
//!
//! A client holds one WebSocket per conversation. Utterances arrive as audio
//! chunks or as text, replies go out as a stream of thought deltas, mood
//! shifts and ordered audio fragments.
//!
//! ## Envelope
//!
//! Every text frame in either direction is
//!
//! ```json
//! {"msg_id": "c-42", "type": "client.text_request", "timestamp": 1730000000000, "payload": {...}}
//! ```
//!
//! `message_id` is accepted in place of `msg_id`. Server messages echo the
//! `msg_id` of the client message that caused them. Binary frames are ignored.
//!
//! ### Incoming Messages
//! - `client.auth_handshake` `{access_token, client_version?}` - must come first; everything else is dropped until it succeeds
//! - `client.wake_up` `{trigger_reason?}` - logged
//! - `client.audio_chunk` `{audio_b64, is_last}` - buffered; `is_last` closes the utterance and starts recognition
//! - `client.text_request` `{text, chat_history: [{role, content}]}` - starts a turn, superseding the current one
//! - `client.interrupt` `{reason?}` - supersedes the current turn, no reply
//! - `client.system_tick`, `client.embed_request`, `client.action_result` - accepted and ignored
//!
//! ### Outgoing Messages
//! - `server.asr_result` `{text, is_valid_speech}`
//! - `server.thought_stream` `{chunk, is_end}`
//! - `server.emotion_shift` `{ai_mood_score, live2d_expression, live2d_motion, vad_sensitivity}`
//! - `server.tts_audio` `{audio_b64, sync_text, sentence_id, is_reply_end}` - `sentence_id` is `0` for the
//!   filler, `1..` for sentences in order and `-1` with `is_reply_end` for the end of the reply
//! - `server.error` `{message}`
//!
//! ## JavaScript Client Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8000/ws');
//! const send = (type, payload) => ws.send(JSON.stringify({
//!   msg_id: crypto.randomUUID(), type, timestamp: Date.now(), payload,
//! }));
//!
//! ws.onopen = () => {
//!   send('client.auth_handshake', { access_token: 'neural_link_secret' });
//!   send('client.text_request', { text: '你好', chat_history: [] });
//! };
//!
//! ws.onmessage = (event) => {
//!   const message = JSON.parse(event.data);
//!   switch (message.type) {
//!     case 'server.thought_stream':
//!       showThought(message.payload.chunk, message.payload.is_end);
//!       break;
//!     case 'server.tts_audio':
//!       if (message.payload.is_reply_end) { onReplyFinished(); break; }
//!       playAudio(message.payload.audio_b64, message.payload.sync_text);
//!       break;
//!     case 'server.emotion_shift':
//!       setExpression(message.payload.live2d_expression, message.payload.vad_sensitivity);
//!       break;
//!     case 'server.error':
//!       console.error(message.payload.message);
//!       break;
//!   }
//! };
//!
//! // Barge-in: stop playback locally and tell the server to drop the turn
//! function interrupt() {
//!   send('client.interrupt', { reason: 'user_speaking' });
//! }
//! ```

pub mod audio_handler;
pub mod error;
pub mod handler;
pub mod messages;
pub mod processor;
pub mod session_handler;
pub mod sink;
pub mod state;
pub mod text_handler;


// Re-export commonly used items
pub use error::{WebSocketError, WebSocketResult};
pub use handler::ws_voice_handler;
pub use messages::{ClientEnvelope, IncomingMessage, OutgoingMessage, ServerPayload};
pub use sink::WsEventSink;
pub use state::ConnectionState;
