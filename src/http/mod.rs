//! HTTP API server: the control surface that stands in for the UI shell
//!
//! This module provides a REST API for driving the session and visualizer:
//! - POST /session/connect - Open a session
//! - POST /session/disconnect - Close the session (idempotent)
//! - GET /session/status - Observable session state
//! - GET /session/transcript - Accumulated transcript
//! - POST /visualizer - Toggle the listening flag
//! - GET/PUT /settings - Audio-processing settings (store-only)
//! - POST /voice - Forward raw audio to the speech backend
//! - GET /logs - Recent log history
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
