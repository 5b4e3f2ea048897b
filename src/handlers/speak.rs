use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::core::segmenter::{MAX_SPEED_FACTOR, MIN_SPEED_FACTOR, strip_speed_tags};
use crate::core::tts::synthesize_with_timeout;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Request body for the speak endpoint
#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    /// The text to synthesize; may carry a `[speed=<n>]` tag
    pub text: String,
    /// Overrides any speed tag in the text
    #[serde(default)]
    pub speed_factor: Option<f32>,
}

/// Handler for the /speak endpoint
///
/// Synthesizes one utterance through the configured synthesis collaborator and
/// returns the audio payload as-is.
pub async fn speak_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeakRequest>,
) -> AppResult<Response> {
    let (text, tagged_speed) = strip_speed_tags(&request.text);
    if text.is_empty() {
        return Err(AppError::BadRequest("Text cannot be empty".to_string()));
    }

    let speed_factor = match request.speed_factor {
        Some(speed) if speed.is_finite() => speed.clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR),
        Some(speed) => {
            return Err(AppError::BadRequest(format!("Invalid speed_factor: {speed}")));
        }
        None => tagged_speed,
    };

    info!(
        "Speak request received - text length: {}, speed: {}",
        text.len(),
        speed_factor
    );

    let core = &state.core_state;
    let audio = synthesize_with_timeout(
        core.tts.as_ref(),
        &text,
        speed_factor,
        core.turn_settings.sentence_timeout,
    )
    .await?;

    info!("Speak request synthesized {} bytes", audio.len());

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        audio,
    )
        .into_response())
}
