use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session events
        .route("/users/:user_id/start", post(handlers::start))
        .route("/users/:user_id/fragments", post(handlers::submit_fragment))
        .route("/users/:user_id/result", get(handlers::listen))
        .route("/users/:user_id/add-more", post(handlers::add_more))
        .route("/users/:user_id/messages", post(handlers::text_message))
        // Session queries
        .route("/users/:user_id/session", get(handlers::session_status))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
