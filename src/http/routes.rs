use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/session/connect", post(handlers::connect_session))
        .route("/session/disconnect", post(handlers::disconnect_session))
        .route("/session/status", get(handlers::session_status))
        .route("/session/transcript", get(handlers::session_transcript))
        // Visualizer listening flag
        .route("/visualizer", post(handlers::set_visualizer))
        // Audio-processing settings
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        // Speech backend forwarding
        .route("/voice", post(handlers::process_voice))
        // Log history
        .route("/logs", get(handlers::get_logs))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        // Browser front ends call this API cross-origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
