use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{Value, json};

use crate::state::AppState;

/// Health check handler
/// Reports that the server is up and which collaborators it talks to
pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    let core = &state.core_state;
    Ok(Json(json!({
        "status": "OK",
        "providers": {
            "stt": core.stt.provider_name(),
            "tts": core.tts.provider_name(),
            "llm": core.llm.provider_name(),
        }
    })))
}
