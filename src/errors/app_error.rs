use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::core::tts::TTSError;

/// Errors returned by the HTTP handlers
///
/// Details are logged; clients get a generic message and the status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// A collaborator answered with an error
    #[error("Upstream error: {0}")]
    Upstream(String),
    /// A collaborator did not answer in time
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "Bad request",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Upstream(_) => "Upstream service error",
            AppError::UpstreamTimeout(_) => "Upstream service timeout",
            AppError::InternalServerError(_) => "Internal server error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::BadRequest(_) | AppError::Unauthorized(_) => tracing::warn!("{}", self),
            _ => tracing::error!("{}", self),
        }

        let body = Json(json!({
            "error": self.public_message(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<TTSError> for AppError {
    fn from(err: TTSError) -> Self {
        match err {
            TTSError::InvalidConfiguration(msg) => AppError::BadRequest(msg),
            TTSError::TimeoutError(msg) => AppError::UpstreamTimeout(msg),
            TTSError::ProviderError(msg)
            | TTSError::ConnectionFailed(msg)
            | TTSError::NetworkError(msg) => AppError::Upstream(msg),
            TTSError::AudioGenerationFailed(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<Box<dyn std::error::Error>> for AppError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
