//! WebSocket message processing orchestrator
//!
//! Routes decoded client messages to the session, audio and text handlers.
//! Until the handshake succeeds every other message is dropped silently.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::state::AppState;

use super::{
    audio_handler::handle_audio_chunk,
    messages::{IncomingMessage, OutgoingMessage},
    session_handler::{handle_auth_handshake, handle_interrupt, handle_wake_up},
    state::ConnectionState,
    text_handler::handle_text_request,
};

/// Process one decoded client message
///
/// # Arguments
/// * `msg_id` - Identifier of the client message, echoed on every reply it causes
/// * `msg` - The decoded message
/// * `state` - Connection state shared with the tasks this message spawns
/// * `message_tx` - Channel for sending messages back to the client
/// * `app_state` - Application state holding configuration and collaborators
#[inline]
pub fn handle_incoming_message(
    msg_id: String,
    msg: IncomingMessage,
    state: &ConnectionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    app_state: &Arc<AppState>,
) {
    if !state.is_authenticated() && !msg.is_handshake() {
        debug!(
            "Dropping message {} from unauthenticated session {}",
            msg_id, state.session_id
        );
        return;
    }

    match msg {
        IncomingMessage::AuthHandshake(payload) => {
            handle_auth_handshake(payload, state, &app_state.config)
        }
        IncomingMessage::WakeUp(payload) => handle_wake_up(payload, state),
        IncomingMessage::Interrupt(payload) => handle_interrupt(payload, state),
        IncomingMessage::AudioChunk(payload) => {
            if let Err(e) = handle_audio_chunk(msg_id, payload, state, message_tx, app_state) {
                warn!("Dropping audio chunk on {}: {}", state.session_id, e);
            }
        }
        IncomingMessage::TextRequest(payload) => {
            handle_text_request(msg_id, payload, state, message_tx, app_state);
        }
        IncomingMessage::Ignored(kind) => {
            debug!("Ignoring {:?} on {}", kind, state.session_id);
        }
    }
}
