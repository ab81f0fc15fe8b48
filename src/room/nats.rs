//! NATS-backed room service.
//!
//! One NATS connection per session. Outbound audio goes to
//! `room.<name>.audio.frame` as base64 JSON; track announcements go to
//! `room.<name>.track`; anything published under `room.<name>.data.>`
//! (transcript fragments from the speech service) is surfaced verbatim as
//! `RoomEvent::DataReceived`.

use super::client::{LocalTrack, RoomConnection, RoomEvent, RoomHandle, RoomOptions, RoomService};
use super::messages::{AudioFrameMessage, TrackAnnouncement};
use crate::audio::AudioFrame;
use crate::error::VoiceError;
use base64::Engine;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct NatsRoomService;

impl NatsRoomService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl RoomService for NatsRoomService {
    async fn connect(
        &self,
        url: &str,
        token: &str,
        options: &RoomOptions,
    ) -> Result<RoomConnection, VoiceError> {
        info!("Connecting to room service at {} (room: {})", url, options.room);

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let state_tx = events_tx.clone();
        let client = async_nats::ConnectOptions::with_token(token.to_string())
            .event_callback(move |event| {
                let tx = state_tx.clone();
                async move {
                    match event {
                        async_nats::Event::Connected => {
                            let _ = tx.send(RoomEvent::Connected).await;
                        }
                        async_nats::Event::Disconnected => {
                            let _ = tx.send(RoomEvent::Disconnected).await;
                        }
                        other => debug!("room transport event: {other}"),
                    }
                }
            })
            .connect(url)
            .await
            .map_err(|err| {
                VoiceError::connection_with(
                    format!("failed to connect to room service at {url}"),
                    Box::new(err),
                )
            })?;

        // Data channel: everything the remote side publishes for this room.
        let data_subject = format!("room.{}.data.>", options.room);
        let mut data_sub = client.subscribe(data_subject.clone()).await.map_err(|err| {
            VoiceError::connection_with(
                format!("failed to subscribe to {data_subject}"),
                Box::new(err),
            )
        })?;

        let data_tx = events_tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = data_sub.next().await {
                if data_tx
                    .send(RoomEvent::DataReceived {
                        payload: msg.payload.to_vec(),
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            debug!("room data subscription closed");
        });

        info!("Connected to room '{}'", options.room);
        let _ = events_tx.send(RoomEvent::Connected).await;

        Ok(RoomConnection {
            handle: Arc::new(NatsRoom {
                client,
                room: options.room.clone(),
            }),
            events: events_rx,
        })
    }
}

pub struct NatsRoom {
    client: async_nats::Client,
    room: String,
}

impl NatsRoom {
    async fn announce_track(&self, track: &LocalTrack, published: bool) -> Result<(), VoiceError> {
        let subject = format!("room.{}.track", self.room);
        let announcement = TrackAnnouncement {
            room: self.room.clone(),
            sid: track.sid.clone(),
            name: track.name.clone(),
            sample_rate: track.sample_rate,
            channels: track.channels,
            published,
        };

        let payload = serde_json::to_vec(&announcement)
            .map_err(|err| VoiceError::connection_with("failed to encode track announcement", Box::new(err)))?;

        self.client
            .publish(subject, payload.into())
            .await
            .map_err(|err| {
                VoiceError::connection_with(
                    format!("failed to announce track {}", track.sid),
                    Box::new(err),
                )
            })
    }
}

#[async_trait::async_trait]
impl RoomHandle for NatsRoom {
    async fn publish_track(&self, track: &LocalTrack) -> Result<(), VoiceError> {
        info!("Publishing track {} to room '{}'", track.sid, self.room);
        self.announce_track(track, true).await
    }

    async fn unpublish_track(&self, track: &LocalTrack) -> Result<(), VoiceError> {
        info!("Unpublishing track {} from room '{}'", track.sid, self.room);
        self.announce_track(track, false).await
    }

    async fn publish_audio(
        &self,
        frame: &AudioFrame,
        sequence: u32,
        final_frame: bool,
    ) -> Result<(), VoiceError> {
        let subject = format!("room.{}.audio.frame", self.room);

        let pcm_bytes: Vec<u8> = frame.samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let message = AudioFrameMessage {
            room: self.room.clone(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(&pcm_bytes),
            sample_rate: frame.sample_rate,
            channels: frame.channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame,
        };

        let payload = serde_json::to_vec(&message)
            .map_err(|err| VoiceError::connection_with("failed to encode audio frame", Box::new(err)))?;

        self.client
            .publish(subject, payload.into())
            .await
            .map_err(|err| {
                VoiceError::connection_with("failed to publish audio frame", Box::new(err))
            })?;

        if final_frame {
            debug!("Published final audio frame (sequence={sequence})");
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), VoiceError> {
        info!("Closing room '{}' connection", self.room);
        if let Err(err) = self.client.flush().await {
            warn!("flush on disconnect failed: {err}");
        }
        // async-nats tears the connection down when the client drops.
        Ok(())
    }
}
