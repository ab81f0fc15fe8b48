//! Remote session service boundary.
//!
//! The session manager consumes the room purely through the `RoomService`
//! and `RoomHandle` traits; `NatsRoomService` is the production transport
//! and tests substitute scripted fakes.

pub mod client;
pub mod messages;
pub mod nats;

pub use client::{
    ConnectionQuality, LocalTrack, RoomConnection, RoomEvent, RoomHandle, RoomOptions, RoomService,
};
pub use messages::{AudioFrameMessage, TrackAnnouncement};
pub use nats::NatsRoomService;
