pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{Router, middleware::from_fn_with_state, routing::get};

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use crate::core::*;
pub use errors::{AppError, AppResult};
pub use state::AppState;

/// Assemble the full application router: public health check, guarded REST
/// API and the WebSocket endpoint.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let protected_routes = routes::api::create_api_router().layer(from_fn_with_state(
        app_state.clone(),
        middleware::auth::auth_middleware,
    ));

    let ws_routes = routes::ws::create_ws_router();

    let public_routes = Router::new().route("/", get(handlers::api::health_check));

    public_routes
        .merge(protected_routes)
        .merge(ws_routes)
        .with_state(app_state)
}
