//! Latency-masking watchdog and the process-wide filler cache.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::events::AudioFragment;
use super::tts::{BaseTTS, TTSResult, synthesize_with_timeout};
use super::turn::TurnContext;

/// At most one synthesized filler utterance, shared by every connection.
///
/// Population is lazy and may race; every writer stores audio for the same
/// phrase, so whichever write lands last is as good as the other.
#[derive(Debug, Default)]
pub struct FillerCache {
    audio: RwLock<Option<Bytes>>,
}

impl FillerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Bytes> {
        self.audio.read().clone()
    }

    pub fn store(&self, audio: Bytes) {
        *self.audio.write() = Some(audio);
    }

    /// Return the cached filler, synthesizing it on first use.
    ///
    /// The lock is never held across the synthesis call.
    pub async fn get_or_synthesize(
        &self,
        tts: &dyn BaseTTS,
        phrase: &str,
        timeout: Duration,
    ) -> TTSResult<Bytes> {
        if let Some(audio) = self.get() {
            return Ok(audio);
        }

        let audio = synthesize_with_timeout(tts, phrase, 1.0, timeout).await?;
        info!("Cached filler audio ({} bytes)", audio.len());
        self.store(audio.clone());
        Ok(audio)
    }
}

/// Timing and content of the masking filler.
#[derive(Debug, Clone)]
pub struct WatchdogSettings {
    /// Silence tolerated after turn start before the filler plays.
    pub threshold: Duration,
    pub phrase: String,
    pub filler_timeout: Duration,
}

/// Wait out the threshold and cover the silence with the filler if needed.
///
/// Returns `true` if a filler fragment was sent. Cancelling the turn's
/// watchdog token makes this a no-op if it has not fired yet.
pub async fn run_watchdog(
    ctx: Arc<TurnContext>,
    tts: Arc<dyn BaseTTS>,
    cache: Arc<FillerCache>,
    settings: WatchdogSettings,
) -> bool {
    tokio::select! {
        _ = ctx.watchdog_cancelled() => {
            debug!("Watchdog stood down for {}", ctx.generation());
            return false;
        }
        _ = tokio::time::sleep(settings.threshold) => {}
    }

    if !ctx.is_current() || ctx.first_audio_sent() {
        return false;
    }

    let audio = match cache
        .get_or_synthesize(tts.as_ref(), &settings.phrase, settings.filler_timeout)
        .await
    {
        Ok(audio) => audio,
        Err(e) => {
            warn!("Filler synthesis failed, skipping latency mask: {}", e);
            return false;
        }
    };

    let sent = ctx
        .deliver_filler(AudioFragment::filler(audio, settings.phrase.clone()))
        .await;
    if sent {
        info!(
            "No audio after {}ms, sent filler for {}",
            settings.threshold.as_millis(),
            ctx.generation()
        );
    }
    sent
}
