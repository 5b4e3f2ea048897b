use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::core::llm::{BaseLLM, create_llm_provider};
use crate::core::stt::{BaseSTT, create_stt_provider};
use crate::core::tts::{BaseTTS, create_tts_provider};
use crate::core::turn::TurnSettings;
use crate::core::watchdog::FillerCache;

/// Core-specific shared state for the application.
///
/// Holds the collaborator clients every connection shares, the process-wide
/// filler cache and the turn settings resolved from configuration.
#[derive(Clone)]
pub struct CoreState {
    pub stt: Arc<dyn BaseSTT>,
    pub tts: Arc<dyn BaseTTS>,
    pub llm: Arc<dyn BaseLLM>,
    /// Synthesized once on first use, then reused by every connection
    pub filler_cache: Arc<FillerCache>,
    pub turn_settings: TurnSettings,
}

impl CoreState {
    /// Initialize core state, building the collaborator clients from configuration.
    pub async fn new(config: &ServerConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let stt = create_stt_provider(&config.stt_provider, config.stt_config())?;
        let tts = create_tts_provider(&config.tts_provider, config.tts_config())?;
        let llm = create_llm_provider(&config.llm_provider, config.llm_config())?;

        info!(
            "Collaborators ready: stt={} tts={} llm={} ({})",
            stt.provider_name(),
            tts.provider_name(),
            llm.provider_name(),
            config.llm_model
        );

        Ok(Self::with_providers(
            Arc::from(stt),
            Arc::from(tts),
            Arc::from(llm),
            config.turn_settings(),
        ))
    }

    /// Assemble core state from already-built collaborators.
    pub fn with_providers(
        stt: Arc<dyn BaseSTT>,
        tts: Arc<dyn BaseTTS>,
        llm: Arc<dyn BaseLLM>,
        turn_settings: TurnSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            stt,
            tts,
            llm,
            filler_cache: Arc::new(FillerCache::new()),
            turn_settings,
        })
    }
}
