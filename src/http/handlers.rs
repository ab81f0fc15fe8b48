use super::state::AppState;
use crate::error::{ErrorCode, VoiceError};
use crate::session::SessionOptions;
use crate::settings::AudioSettings;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    /// Credential accepted by the room service
    pub token: String,

    /// Optional room name (falls back to the configured default)
    pub room: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VisualizerRequest {
    pub listening: bool,
}

#[derive(Debug, Serialize)]
pub struct VisualizerResponse {
    pub listening: bool,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
    pub fragments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
}

impl ErrorResponse {
    fn from_error(err: &VoiceError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code(),
        }
    }
}

fn error_status(err: &VoiceError) -> StatusCode {
    match err.code() {
        ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorCode::ConnectionError => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::DeviceError | ErrorCode::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session/connect
/// Open a session (tearing down any existing one first)
pub async fn connect_session(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> impl IntoResponse {
    if req.token.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "a non-empty token is required".to_string(),
                code: ErrorCode::ConnectionError,
            }),
        )
            .into_response();
    }

    info!("Connect requested (room: {:?})", req.room);

    let options = SessionOptions { room: req.room };
    match state.session.connect(&req.token, options).await {
        Ok(()) => (StatusCode::OK, Json(state.session.snapshot())).into_response(),
        Err(err) => {
            error!("Connect failed: {err}");
            (error_status(&err), Json(ErrorResponse::from_error(&err))).into_response()
        }
    }
}

/// POST /session/disconnect
/// Close the session; a no-op when none is active
pub async fn disconnect_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.disconnect().await {
        Ok(()) => (StatusCode::OK, Json(state.session.snapshot())).into_response(),
        Err(err) => {
            // The session is cleared even when teardown reports a failure.
            error!("Disconnect reported: {err}");
            (error_status(&err), Json(ErrorResponse::from_error(&err))).into_response()
        }
    }
}

/// GET /session/status
pub async fn session_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.snapshot()))
}

/// GET /session/transcript
/// Transcript accumulated so far
pub async fn session_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let transcript = state.session.transcript_text().await;
    let fragments = state.session.transcript_fragments().await;
    (
        StatusCode::OK,
        Json(TranscriptResponse {
            transcript,
            fragments,
        }),
    )
}

/// POST /visualizer
/// Toggle the listening flag driving the paint loop
pub async fn set_visualizer(
    State(state): State<AppState>,
    Json(req): Json<VisualizerRequest>,
) -> impl IntoResponse {
    state.visualizer.set_listening(req.listening).await;
    (
        StatusCode::OK,
        Json(VisualizerResponse {
            listening: state.visualizer.is_listening().await,
        }),
    )
}

/// GET /settings
pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.settings.get()))
}

/// PUT /settings
/// Store-only: these values are not applied to live capture constraints
pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<AudioSettings>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(state.settings.update(settings)))
}

/// GET /logs
/// Recent log history from the injected logger's ring buffer
pub async fn get_logs(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.logger.recent()))
}

/// POST /voice
/// Forward a raw audio payload to the speech backend and pass its JSON
/// result through
pub async fn process_voice(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let upstream = state
        .http
        .post(&state.speech_endpoint)
        .header("content-type", "audio/raw")
        .body(body.to_vec())
        .send()
        .await;

    let response = match upstream {
        Ok(response) => response,
        Err(err) => {
            error!("Error processing audio: {err}");
            return speech_failure();
        }
    };

    if !response.status().is_success() {
        error!("Speech backend returned {}", response.status());
        return speech_failure();
    }

    match response.json::<serde_json::Value>().await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            error!("Error processing audio: {err}");
            speech_failure()
        }
    }
}

fn speech_failure() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Failed to process audio" })),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
