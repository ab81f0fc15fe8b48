use serde::{Deserialize, Serialize};

/// Audio frame published to the room's audio subject
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub room: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Track publish/unpublish announcement
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackAnnouncement {
    pub room: String,
    pub sid: String,
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub published: bool,
}
