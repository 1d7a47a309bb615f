//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Task snapshots
        .route("/projects/{project_id}/tasks", put(handlers::store_tasks))
        .route("/projects/{project_id}/tasks", get(handlers::list_tasks))
        // Validation over caller-supplied task lists
        .route("/validate", post(handlers::validate))
        // Conflict detection and resolution
        .route("/projects/{project_id}/conflicts", get(handlers::get_conflicts))
        .route("/conflicts/{signature}/resolve", post(handlers::resolve_conflict))
        // Inspection scheduling
        .route("/projects/{project_id}/inspections", get(handlers::get_inspections))
        .route(
            "/projects/{project_id}/inspections/{phase}",
            put(handlers::set_inspection_date),
        )
        // Optimization and combined analysis
        .route("/projects/{project_id}/optimization", get(handlers::get_optimization))
        .route("/projects/{project_id}/analysis", get(handlers::get_analysis));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Allow large task snapshots during uploads.
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
