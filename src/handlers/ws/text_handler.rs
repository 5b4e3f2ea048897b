//! Text request handling: every request starts a new turn.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::turn::{TurnOutcome, TurnRequest, run_turn};
use crate::state::AppState;

use super::messages::{OutgoingMessage, TextRequestPayload};
use super::sink::WsEventSink;
use super::state::ConnectionState;

/// Supersede the current turn and run a new one on its own task.
///
/// A request with blank text is dropped without touching the current turn.
pub fn handle_text_request(
    msg_id: String,
    payload: TextRequestPayload,
    state: &ConnectionState,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    app_state: &Arc<AppState>,
) -> Option<JoinHandle<TurnOutcome>> {
    if payload.text.trim().is_empty() {
        warn!("Ignoring blank text request on {}", state.session_id);
        return None;
    }

    let guard = state.begin_generation();
    info!(
        "Text request on {} ({} prior turns) as {}",
        state.session_id,
        payload.chat_history.len(),
        guard.generation()
    );

    let request = TurnRequest {
        user_text: payload.text,
        history: payload.chat_history,
    };
    let sink = Arc::new(WsEventSink::new(
        msg_id,
        guard.clone(),
        message_tx.clone(),
    ));
    let core = app_state.core_state.clone();
    Some(tokio::spawn(run_turn(guard, request, core, sink)))
}
