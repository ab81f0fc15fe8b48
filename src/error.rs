use serde::Serialize;
use thiserror::Error;

/// Boxed source error kept alongside connection failures so the original
/// cause stays inspectable after the single wrapping step.
pub type ErrorSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error taxonomy for the voice session core.
///
/// Low-level failures are wrapped exactly once into one of these variants
/// and surfaced to callers as a single human-readable message. There are
/// no automatic retries anywhere; every retry is a fresh caller action.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// The user (or OS) declined microphone access.
    #[error("microphone access was denied: {0}")]
    PermissionDenied(String),

    /// Capture hardware or driver failure.
    #[error("audio device error: {0}")]
    Device(String),

    /// Room open, publish, or transport failure.
    #[error("connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<ErrorSource>,
    },

    /// Anything that does not fit the categories above.
    #[error("{0}")]
    Unknown(String),
}

/// Stable error codes exposed through the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PermissionDenied,
    DeviceError,
    ConnectionError,
    UnknownError,
}

impl VoiceError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn connection_with(message: impl Into<String>, source: ErrorSource) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Classify a capture-acquisition failure.
    ///
    /// cpal and the OS report permission refusals as free-form messages, so
    /// this sniffs the error chain text the same way the browser code keyed
    /// off `NotAllowedError`. Everything else is a device failure.
    pub fn from_capture(err: anyhow::Error) -> Self {
        let text = format!("{err:#}");
        let lowered = text.to_lowercase();
        if lowered.contains("permission") || lowered.contains("denied") || lowered.contains("not allowed") {
            Self::PermissionDenied(text)
        } else {
            Self::Device(text)
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Device(_) => ErrorCode::DeviceError,
            Self::Connection { .. } => ErrorCode::ConnectionError,
            Self::Unknown(_) => ErrorCode::UnknownError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_classification_spots_permission_refusals() {
        let err = anyhow::anyhow!("Access denied by the user");
        assert_eq!(VoiceError::from_capture(err).code(), ErrorCode::PermissionDenied);

        let err = anyhow::anyhow!("device disconnected mid-stream");
        assert_eq!(VoiceError::from_capture(err).code(), ErrorCode::DeviceError);
    }

    #[test]
    fn connection_error_keeps_its_source() {
        let cause: ErrorSource = "socket closed".into();
        let err = VoiceError::connection_with("failed to open room", cause);
        assert_eq!(err.code(), ErrorCode::ConnectionError);
        assert!(std::error::Error::source(&err).is_some());
    }
}
