use crate::errors::AppError;
use crate::handlers::ws::session_handler::token_matches;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Bearer token middleware for the REST API
///
/// When `AUTH_REQUIRED=true` the request must carry
/// `Authorization: Bearer <AUTH_ACCESS_TOKEN>`; otherwise it passes through.
/// The token is the same credential the WebSocket handshake checks.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = match state.config.access_token.as_deref() {
        Some(token) if state.config.auth_required && !token.is_empty() => token,
        _ => {
            tracing::debug!("Authentication disabled, passing request through");
            return Ok(next.run(request).await);
        }
    };

    let request_method = request.method().to_string();
    let request_path = request.uri().path().to_string();

    let token = request
        .headers()
        .get("authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    if !token_matches(token, expected) {
        tracing::warn!(
            method = %request_method,
            path = %request_path,
            "Bearer authentication failed: token mismatch"
        );
        return Err(AppError::Unauthorized("Invalid access token".to_string()));
    }

    tracing::debug!(
        method = %request_method,
        path = %request_path,
        "Bearer authentication successful"
    );
    Ok(next.run(request).await)
}
