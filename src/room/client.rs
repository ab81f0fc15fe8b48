use crate::audio::AudioFrame;
use crate::error::VoiceError;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Reported quality of the link to the room service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Poor,
    Lost,
}

/// Events emitted by a live room connection.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    Connected,
    Disconnected,
    TrackSubscribed { sid: String },
    TrackUnsubscribed { sid: String },
    ConnectionQualityChanged { quality: ConnectionQuality },
    MediaDeviceError { message: String },
    /// Inbound data-channel payload (transcript fragments arrive here).
    DataReceived { payload: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct RoomOptions {
    /// Room name to join.
    pub room: String,
}

/// A local capture track registered with the room.
#[derive(Debug, Clone, Serialize)]
pub struct LocalTrack {
    pub sid: String,
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

impl LocalTrack {
    pub fn microphone(sample_rate: u32, channels: u16) -> Self {
        Self {
            sid: format!("TR_{}", uuid::Uuid::new_v4().simple()),
            name: "microphone".to_string(),
            sample_rate,
            channels,
        }
    }
}

/// A freshly opened connection: the handle for outbound calls plus the
/// event stream for everything inbound.
pub struct RoomConnection {
    pub handle: Arc<dyn RoomHandle>,
    pub events: mpsc::Receiver<RoomEvent>,
}

/// Remote session service, consumed only through this contract.
#[async_trait::async_trait]
pub trait RoomService: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        token: &str,
        options: &RoomOptions,
    ) -> Result<RoomConnection, VoiceError>;
}

/// One live connection to the room service.
#[async_trait::async_trait]
pub trait RoomHandle: Send + Sync {
    async fn publish_track(&self, track: &LocalTrack) -> Result<(), VoiceError>;

    async fn unpublish_track(&self, track: &LocalTrack) -> Result<(), VoiceError>;

    /// Push one buffer of published-track audio to the room.
    async fn publish_audio(
        &self,
        frame: &AudioFrame,
        sequence: u32,
        final_frame: bool,
    ) -> Result<(), VoiceError>;

    async fn disconnect(&self) -> Result<(), VoiceError>;
}
