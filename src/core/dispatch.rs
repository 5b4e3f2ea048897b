//! Ordered synthesis dispatch
//!
//! One unbounded FIFO channel and one worker per turn. The producer side is the
//! turn pipeline pushing [`SentenceUnit`]s; the worker synthesizes them one at a
//! time, so audio reaches the client in sequence order without any reordering.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::events::AudioFragment;
use super::segmenter::SentenceUnit;
use super::tts::{BaseTTS, synthesize_with_timeout};
use super::turn::TurnContext;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchItem {
    Sentence(SentenceUnit),
    /// No more sentences for this turn.
    Finished,
}

/// Producer half of the dispatch channel.
#[derive(Debug)]
pub struct SynthesisQueue {
    tx: mpsc::UnboundedSender<DispatchItem>,
}

impl SynthesisQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DispatchItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns `false` if the worker has already stopped.
    pub fn enqueue(&self, unit: SentenceUnit) -> bool {
        self.tx.send(DispatchItem::Sentence(unit)).is_ok()
    }

    /// Send the terminal sentinel and give up the producer side.
    pub fn finish(self) -> bool {
        self.tx.send(DispatchItem::Finished).is_ok()
    }
}

/// What the worker did before it stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: u32,
    pub skipped: u32,
    /// The end-of-reply marker was sent.
    pub completed: bool,
    /// The worker stopped because its generation was replaced.
    pub superseded: bool,
}

/// Consume the queue until the sentinel, a closed channel or a stale generation.
///
/// A failed or timed out synthesis call skips that sentence only. A stale
/// generation stops the worker without draining what is left in the queue.
pub async fn run_synthesis_worker(
    ctx: Arc<TurnContext>,
    tts: Arc<dyn BaseTTS>,
    mut rx: mpsc::UnboundedReceiver<DispatchItem>,
    sentence_timeout: Duration,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    loop {
        if !ctx.is_current() {
            report.superseded = true;
            break;
        }

        let Some(item) = rx.recv().await else {
            debug!("Dispatch queue closed for {}", ctx.generation());
            break;
        };

        match item {
            DispatchItem::Sentence(unit) => {
                if !ctx.is_current() {
                    report.superseded = true;
                    break;
                }

                let result = synthesize_with_timeout(
                    tts.as_ref(),
                    &unit.text,
                    unit.speed_factor,
                    sentence_timeout,
                )
                .await;

                match result {
                    Ok(audio) => {
                        let fragment = AudioFragment::sentence(unit.sequence, audio, unit.text);
                        if !ctx.deliver_sentence(fragment).await {
                            debug!(
                                "Dropping stale audio for sentence {} of {}",
                                unit.sequence,
                                ctx.generation()
                            );
                            report.superseded = true;
                            break;
                        }
                        report.delivered += 1;
                    }
                    Err(e) => {
                        error!("Synthesis failed for sentence {}: {}", unit.sequence, e);
                        report.skipped += 1;
                    }
                }
            }
            DispatchItem::Finished => {
                if ctx.deliver_end_of_reply().await {
                    info!(
                        "Reply finished for {} ({} delivered, {} skipped)",
                        ctx.generation(),
                        report.delivered,
                        report.skipped
                    );
                    report.completed = true;
                } else {
                    report.superseded = true;
                }
                break;
            }
        }
    }

    report
}
