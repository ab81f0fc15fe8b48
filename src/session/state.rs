use crate::room::LocalTrack;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Connection lifecycle of the (at most one) live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Observable session state, published through a watch channel so consumers
/// get change notification instead of polling internals.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    pub last_error: Option<String>,
    pub local_tracks: Vec<LocalTrack>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn disconnected() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            last_error: None,
            local_tracks: Vec::new(),
            connected_at: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Per-connect options supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Room to join; falls back to the configured default room.
    pub room: Option<String>,
}
