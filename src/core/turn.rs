//! Per-turn pipeline
//!
//! A turn streams the generation collaborator's output through the
//! [`StreamExtractor`], reports thought deltas and mood shifts inline, and feeds
//! `speak` deltas to the [`SentenceSegmenter`]. Finished sentences go to the
//! synthesis worker while the latency watchdog races the first audio fragment.
//!
//! ```text
//! tokens ──► extractor ──► thought deltas ──► mood tracker ──► sink
//!                    └───► segmenter ──► SynthesisQueue ──► worker ──► sink
//!                                         watchdog (filler) ──────────► sink
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::Mutex;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error, info, warn};

use super::dispatch::{DispatchReport, SynthesisQueue, run_synthesis_worker};
use super::events::{AudioFragment, TurnEvent, TurnEventSink};
use super::extractor::StreamExtractor;
use super::generation::{Generation, GenerationGuard};
use super::llm::{ChatTurn, LLMError, build_prompt};
use super::mood::MoodTracker;
use super::segmenter::SentenceSegmenter;
use super::state::CoreState;
use super::watchdog::{WatchdogSettings, run_watchdog};

/// Shared state of one turn, visible to the producer, the worker and the watchdog.
pub struct TurnContext {
    guard: GenerationGuard,
    /// Only ever set by the synthesis worker.
    first_audio_sent: AtomicBool,
    watchdog: CancellationToken,
    /// Serializes audio emission so the filler check and a real fragment never interleave.
    audio_gate: Mutex<()>,
    sink: Arc<dyn TurnEventSink>,
}

impl TurnContext {
    pub fn new(guard: GenerationGuard, sink: Arc<dyn TurnEventSink>) -> Self {
        Self {
            guard,
            first_audio_sent: AtomicBool::new(false),
            watchdog: CancellationToken::new(),
            audio_gate: Mutex::new(()),
            sink,
        }
    }

    #[inline]
    pub fn is_current(&self) -> bool {
        self.guard.is_current()
    }

    pub fn generation(&self) -> Generation {
        self.guard.generation()
    }

    pub fn first_audio_sent(&self) -> bool {
        self.first_audio_sent.load(Ordering::Acquire)
    }

    pub fn stand_down_watchdog(&self) {
        self.watchdog.cancel();
    }

    pub fn watchdog_cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.watchdog.cancelled()
    }

    /// Send a non-audio event unless the turn has been superseded.
    pub async fn emit_if_current(&self, event: TurnEvent) -> bool {
        if !self.is_current() {
            return false;
        }
        self.sink.emit(event).await;
        true
    }

    /// Send a real sentence fragment, marking first audio and standing the watchdog down.
    pub(crate) async fn deliver_sentence(&self, fragment: AudioFragment) -> bool {
        let _gate = self.audio_gate.lock().await;
        if !self.is_current() {
            return false;
        }
        self.first_audio_sent.store(true, Ordering::Release);
        self.watchdog.cancel();
        self.sink.emit(TurnEvent::Audio(fragment)).await;
        true
    }

    /// Send the filler, only while no real audio has gone out.
    pub(crate) async fn deliver_filler(&self, fragment: AudioFragment) -> bool {
        let _gate = self.audio_gate.lock().await;
        if !self.is_current() || self.first_audio_sent() || self.watchdog.is_cancelled() {
            return false;
        }
        self.sink.emit(TurnEvent::Audio(fragment)).await;
        true
    }

    pub(crate) async fn deliver_end_of_reply(&self) -> bool {
        let _gate = self.audio_gate.lock().await;
        self.watchdog.cancel();
        if !self.is_current() {
            return false;
        }
        self.sink
            .emit(TurnEvent::Audio(AudioFragment::end_of_reply()))
            .await;
        true
    }
}

/// Knobs shared by every turn, resolved from configuration once.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub assistant_name: String,
    pub latency_mask: Duration,
    pub filler_phrase: String,
    pub filler_timeout: Duration,
    pub sentence_timeout: Duration,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            assistant_name: "Xiaozhi".to_string(),
            latency_mask: Duration::from_millis(600),
            filler_phrase: "嗯……".to_string(),
            filler_timeout: Duration::from_millis(3000),
            sentence_timeout: Duration::from_millis(15000),
        }
    }
}

impl TurnSettings {
    fn watchdog(&self) -> WatchdogSettings {
        WatchdogSettings {
            threshold: self.latency_mask,
            phrase: self.filler_phrase.clone(),
            filler_timeout: self.filler_timeout,
        }
    }
}

/// What the client asked for.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub user_text: String,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed(DispatchReport),
    /// A newer generation took over before the reply finished.
    Superseded,
    Failed(String),
}

/// Run one turn to completion, supersession or failure.
///
/// # Arguments
/// * `guard` - Generation minted for this turn
/// * `request` - User text and prior turns
/// * `core` - Collaborators and shared settings
/// * `sink` - Where events for the client go
pub async fn run_turn(
    guard: GenerationGuard,
    request: TurnRequest,
    core: Arc<CoreState>,
    sink: Arc<dyn TurnEventSink>,
) -> TurnOutcome {
    let ctx = Arc::new(TurnContext::new(guard, sink));
    let settings = &core.turn_settings;
    info!("Starting turn {}: {}", ctx.generation(), request.user_text);

    tokio::spawn(run_watchdog(
        ctx.clone(),
        core.tts.clone(),
        core.filler_cache.clone(),
        settings.watchdog(),
    ));

    let (queue, rx) = SynthesisQueue::new();
    let worker = tokio::spawn(run_synthesis_worker(
        ctx.clone(),
        core.tts.clone(),
        rx,
        settings.sentence_timeout,
    ));

    let prompt = build_prompt(&settings.assistant_name, &request.history, &request.user_text);
    let mut stream = match core.llm.stream(&prompt).await {
        Ok(stream) => stream,
        Err(e) => return fail_turn(&ctx, e).await,
    };

    let mut extractor = StreamExtractor::new();
    let mut segmenter = SentenceSegmenter::new();
    let mut mood = MoodTracker::new();

    while let Some(item) = stream.next().await {
        if !ctx.is_current() {
            return supersede(&ctx);
        }

        let fragment = match item {
            Ok(fragment) => fragment,
            Err(e) if e.is_recoverable() => {
                warn!("Skipping generation fragment: {}", e);
                continue;
            }
            Err(e) => return fail_turn(&ctx, e).await,
        };

        let update = extractor.push(&fragment);
        if !update.thought_delta.is_empty() {
            ctx.emit_if_current(TurnEvent::ThoughtDelta {
                chunk: update.thought_delta,
                is_end: false,
            })
            .await;
        }

        for shift in mood.observe(extractor.thought(), update.thought_closed) {
            ctx.emit_if_current(TurnEvent::MoodShift(shift)).await;
        }

        if !update.speak_delta.is_empty()
            && let Some(unit) = segmenter.push(&update.speak_delta)
            && !queue.enqueue(unit)
        {
            debug!("Synthesis worker already stopped for {}", ctx.generation());
        }
    }

    if !ctx.is_current() {
        return supersede(&ctx);
    }

    if extractor.speak().is_empty() {
        warn!(
            "Reply for {} carried no speech: {}",
            ctx.generation(),
            extractor.raw()
        );
    }

    ctx.emit_if_current(TurnEvent::ThoughtDelta {
        chunk: String::new(),
        is_end: true,
    })
    .await;
    for shift in mood.observe(extractor.thought(), true) {
        ctx.emit_if_current(TurnEvent::MoodShift(shift)).await;
    }

    if let Some(unit) = segmenter.finish() {
        queue.enqueue(unit);
    }
    queue.finish();

    match worker.await {
        Ok(report) if report.superseded => TurnOutcome::Superseded,
        Ok(report) => TurnOutcome::Completed(report),
        Err(e) => {
            error!("Synthesis worker for {} panicked: {}", ctx.generation(), e);
            ctx.stand_down_watchdog();
            TurnOutcome::Failed(e.to_string())
        }
    }
}

fn supersede(ctx: &TurnContext) -> TurnOutcome {
    info!("Turn {} superseded, dropping generation", ctx.generation());
    ctx.stand_down_watchdog();
    TurnOutcome::Superseded
}

/// Report a generation failure. Sentences already queued still play; no
/// end-of-reply marker follows.
async fn fail_turn(ctx: &TurnContext, error: LLMError) -> TurnOutcome {
    error!("Generation failed for {}: {}", ctx.generation(), error);
    ctx.stand_down_watchdog();
    ctx.emit_if_current(TurnEvent::Error {
        message: format!("Generation failed: {error}"),
    })
    .await;
    TurnOutcome::Failed(error.to_string())
}
