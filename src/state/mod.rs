use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::CoreState;

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Core layer state holding the collaborator clients and the filler cache
    pub core_state: Arc<CoreState>,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let core_state = CoreState::new(&config).await?;
        Ok(Self::with_core(config, core_state))
    }

    /// Build application state around already-constructed core state
    pub fn with_core(config: ServerConfig, core_state: Arc<CoreState>) -> Arc<Self> {
        Arc::new(Self { config, core_state })
    }
}
