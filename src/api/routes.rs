//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, configure_handler, entries_handler, health_handler, invalidate_handler,
    invalidate_tag_handler, keys_handler, persist_handler, stats_handler, sweep_handler, AppState,
};

/// Creates the admin router.
///
/// # Middleware
/// - CORS: Allows any origin, so the site's admin panel can call it
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/keys", get(keys_handler))
        .route("/entries", get(entries_handler))
        .route("/sweep", post(sweep_handler))
        .route("/persist", post(persist_handler))
        .route("/config", patch(configure_handler))
        .route("/cache", delete(clear_handler))
        .route("/cache/:target", delete(invalidate_handler))
        .route("/tags/:tag", delete(invalidate_tag_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
