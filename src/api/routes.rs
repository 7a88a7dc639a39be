//! API Routes
//!
//! Configures the Axum router: the gateway's own endpoints first, then the
//! fallback that is the interception boundary for all remaining traffic.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, intercept_handler, invalidate_handler, resolve_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /resolve/:kind/:reference` - Resolve an asset reference
/// - `DELETE /invalidate/:kind/:id` - Drop a persisted mapping
/// - `GET /stats` - Resolver and gateway counters
/// - `GET /health` - Health check endpoint
/// - fallback - classified response caching / passthrough
///
/// # Middleware
/// - CORS: Allows any origin (display components call from the site origin)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/resolve/:kind/:reference", get(resolve_handler))
        .route("/invalidate/:kind/:id", delete(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .fallback(intercept_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
