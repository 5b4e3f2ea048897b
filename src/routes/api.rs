use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::speak;
use crate::state::AppState;
use std::sync::Arc;

/// REST routes guarded by the bearer token middleware
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/speak", post(speak::speak_handler))
        .layer(TraceLayer::new_for_http())
}
