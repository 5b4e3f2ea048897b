//! Axum WebSocket handler
//!
//! This module contains the WebSocket upgrade handler for Axum and the
//! per-connection read loop.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

use super::{
    messages::{ClientEnvelope, OutgoingMessage},
    processor::handle_incoming_message,
    state::ConnectionState,
};

/// Outbound messages queued per connection before producers wait
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// WebSocket conversation handler
/// Upgrades the HTTP connection to WebSocket for a conversation session
pub async fn ws_voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_voice_socket(socket, state))
}

/// Handle one WebSocket session from open to close
async fn handle_voice_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let state = Arc::new(ConnectionState::new());
    info!("WebSocket session {} established", state.session_id);

    // Split the socket into sender and receiver
    let (sender, mut receiver) = socket.split();

    let (message_tx, message_rx) = mpsc::channel::<OutgoingMessage>(CHANNEL_BUFFER_SIZE);

    // Single writer: messages reach the socket in the order they were queued
    let sender_task = tokio::spawn(forward_outgoing(message_rx, sender));

    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(msg) => {
                if !process_message(msg, &state, &message_tx, &app_state) {
                    break;
                }
            }
            Err(e) => {
                warn!("WebSocket error on {}: {}", state.session_id, e);
                break;
            }
        }
    }

    // Whatever is still running for this connection must go quiet
    state.invalidate();
    sender_task.abort();

    info!("WebSocket session {} terminated", state.session_id);
}

/// Drain the outbound queue into the socket.
///
/// A message is checked against its turn's generation when it is dequeued, so
/// frames queued before an interrupt never reach the client after it.
pub(crate) async fn forward_outgoing<S>(
    mut message_rx: mpsc::Receiver<OutgoingMessage>,
    mut sender: S,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(message) = message_rx.recv().await {
        if message.is_stale() {
            debug!("Dropping superseded {} frame", message.msg_id);
            continue;
        }

        let json_str = match serde_json::to_string(&message) {
            Ok(json_str) => json_str,
            Err(e) => {
                error!("Failed to serialize outgoing message: {}", e);
                continue;
            }
        };

        if let Err(e) = sender.send(Message::Text(json_str.into())).await {
            error!("Failed to send WebSocket message: {}", e);
            break;
        }
    }
}

/// Process one WebSocket frame
///
/// Returns `false` when the session should end.
fn process_message(
    msg: Message,
    state: &Arc<ConnectionState>,
    message_tx: &mpsc::Sender<OutgoingMessage>,
    app_state: &Arc<AppState>,
) -> bool {
    match msg {
        Message::Text(text) => {
            debug!("Received text message: {} bytes", text.len());

            let decoded = ClientEnvelope::parse(&text).and_then(ClientEnvelope::into_message);
            match decoded {
                Ok((msg_id, incoming)) => {
                    handle_incoming_message(msg_id, incoming, state, message_tx, app_state);
                }
                Err(e) => {
                    error!("Dropping message on {}: {}", state.session_id, e);
                }
            }
            true
        }
        Message::Binary(data) => {
            debug!("Ignoring binary frame of {} bytes", data.len());
            true
        }
        Message::Ping(_) | Message::Pong(_) => {
            // Ping/Pong is handled automatically by axum
            true
        }
        Message::Close(_) => {
            info!("WebSocket session {} closed by client", state.session_id);
            false
        }
    }
}
