//! Bridge from core turn events to the socket's outbound channel.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::events::{TurnEvent, TurnEventSink};
use crate::core::generation::GenerationGuard;

use super::messages::OutgoingMessage;

/// Forwards every event of one turn, tagged with the `msg_id` that started it.
///
/// Messages also carry the turn's generation so the socket writer can drop
/// whatever was still queued when the turn was superseded.
pub struct WsEventSink {
    msg_id: String,
    guard: GenerationGuard,
    tx: mpsc::Sender<OutgoingMessage>,
}

impl WsEventSink {
    pub fn new(
        msg_id: impl Into<String>,
        guard: GenerationGuard,
        tx: mpsc::Sender<OutgoingMessage>,
    ) -> Self {
        Self {
            msg_id: msg_id.into(),
            guard,
            tx,
        }
    }
}

#[async_trait]
impl TurnEventSink for WsEventSink {
    async fn emit(&self, event: TurnEvent) {
        let message =
            OutgoingMessage::from_event(&self.msg_id, event).for_generation(self.guard.clone());
        if self.tx.send(message).await.is_err() {
            debug!("Socket closed, dropping event for {}", self.msg_id);
        }
    }
}
