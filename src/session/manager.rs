use super::state::{ConnectionState, SessionOptions, SessionSnapshot};
use crate::audio::{AudioFrame, CaptureBroker, CaptureConfig, CaptureHandle};
use crate::config::RoomConfig;
use crate::error::VoiceError;
use crate::logging::Logger;
use crate::room::{LocalTrack, RoomEvent, RoomHandle, RoomOptions, RoomService};
use crate::transcript::Transcript;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

/// Owns the lifecycle of a single real-time session: capture acquisition,
/// room connection, track publishing, event handling, and teardown on every
/// exit path.
///
/// Constructed once and passed by reference to whatever needs it; state
/// changes are observed through `subscribe()`.
pub struct SessionManager {
    room_config: RoomConfig,
    room_service: Arc<dyn RoomService>,
    broker: Arc<CaptureBroker>,
    logger: Arc<Logger>,
    transcript: Arc<Mutex<Transcript>>,
    active: Mutex<Option<ActiveSession>>,
    /// Only one acquisition sequence may be in flight at a time.
    connect_in_flight: AtomicBool,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
}

struct ActiveSession {
    handle: Arc<dyn RoomHandle>,
    tracks: Vec<LocalTrack>,
    pump_stop: watch::Sender<bool>,
    pump_task: JoinHandle<()>,
    event_task: JoinHandle<()>,
}

impl SessionManager {
    pub fn new(
        room_config: RoomConfig,
        room_service: Arc<dyn RoomService>,
        broker: Arc<CaptureBroker>,
        logger: Arc<Logger>,
    ) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::disconnected());
        Self {
            room_config,
            room_service,
            broker,
            logger,
            transcript: Arc::new(Mutex::new(Transcript::new())),
            active: Mutex::new(None),
            connect_in_flight: AtomicBool::new(false),
            snapshot: Arc::new(snapshot),
        }
    }

    /// Current observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Change notification for the observable state.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub async fn transcript_text(&self) -> String {
        self.transcript.lock().await.text()
    }

    pub async fn transcript_fragments(&self) -> Vec<String> {
        self.transcript.lock().await.fragments().to_vec()
    }

    /// Open a session: tear down any existing one, acquire capture, connect
    /// to the room, publish one audio track.
    ///
    /// Any failure along the way releases whatever this attempt acquired,
    /// leaves the state `Disconnected` with the error recorded, and returns
    /// the classified error. There is no automatic retry.
    pub async fn connect(&self, token: &str, options: SessionOptions) -> Result<(), VoiceError> {
        if token.trim().is_empty() {
            // Precondition rejection: nothing was acquired and nothing is
            // torn down, so any live session stays reflected in the snapshot.
            let err = VoiceError::connection("a non-empty token is required");
            let text = err.to_string();
            self.update(move |s| s.last_error = Some(text));
            return Err(err);
        }

        if self.connect_in_flight.swap(true, Ordering::SeqCst) {
            // A newer request does not supersede a running one; it is refused
            // so the in-flight sequence keeps sole ownership of its resources.
            return Err(VoiceError::connection("a connect attempt is already in flight"));
        }

        let result = self.connect_inner(token, options).await;
        self.connect_in_flight.store(false, Ordering::SeqCst);

        if let Err(err) = &result {
            self.logger.error(format!("connect failed: {err}"));
            self.record_failure(err);
        }
        result
    }

    async fn connect_inner(&self, token: &str, options: SessionOptions) -> Result<(), VoiceError> {
        // A previous session must be fully gone before anything new is
        // acquired.
        if let Err(err) = self.teardown().await {
            self.logger
                .warn(format!("teardown of previous session reported: {err}"));
        }

        self.update(|s| {
            s.state = ConnectionState::Connecting;
            s.last_error = None;
        });

        let room = options
            .room
            .unwrap_or_else(|| self.room_config.default_room.clone());
        self.logger
            .info(format!("connecting to room '{room}' at {}", self.room_config.url));

        // Step 1: local capture.
        let capture = self.broker.acquire().await?;
        let capture_config = self.broker.config().clone();

        // Step 2: room connection.
        let room_options = RoomOptions { room };
        let connection = match self
            .room_service
            .connect(&self.room_config.url, token, &room_options)
            .await
        {
            Ok(connection) => connection,
            Err(err) => {
                drop(capture);
                return Err(err);
            }
        };

        // Step 3: publish the one audio track.
        let track = LocalTrack::microphone(capture_config.sample_rate, capture_config.channels);
        if let Err(err) = connection.handle.publish_track(&track).await {
            let _ = connection.handle.disconnect().await;
            drop(capture);
            return Err(err);
        }

        let (pump_stop, stop_rx) = watch::channel(false);
        let pump_task = tokio::spawn(run_audio_pump(
            Arc::clone(&connection.handle),
            capture,
            capture_config,
            stop_rx,
            Arc::clone(&self.logger),
        ));
        let event_task = tokio::spawn(run_event_loop(
            connection.events,
            Arc::clone(&self.transcript),
            Arc::clone(&self.snapshot),
            Arc::clone(&self.logger),
        ));

        *self.active.lock().await = Some(ActiveSession {
            handle: connection.handle,
            tracks: vec![track.clone()],
            pump_stop,
            pump_task,
            event_task,
        });

        self.update(|s| {
            s.state = ConnectionState::Connected;
            s.last_error = None;
            s.local_tracks = vec![track];
            s.connected_at = Some(Utc::now());
        });
        self.logger.info("session connected");

        Ok(())
    }

    /// Close the session. Idempotent: with no active session this is a
    /// no-op. A teardown failure is recorded and returned, but the session
    /// handle is cleared regardless.
    pub async fn disconnect(&self) -> Result<(), VoiceError> {
        self.teardown().await
    }

    /// Shutdown-path teardown; identical to `disconnect` but never fails the
    /// caller. Safe to call after an explicit disconnect.
    pub async fn close(&self) {
        if let Err(err) = self.teardown().await {
            self.logger.warn(format!("teardown during shutdown reported: {err}"));
        }
    }

    async fn teardown(&self) -> Result<(), VoiceError> {
        let Some(session) = self.active.lock().await.take() else {
            return Ok(());
        };

        self.logger.info("tearing down session");
        let mut teardown_error: Option<VoiceError> = None;

        // Stop the audio pump first: it sends the final frame and drops the
        // capture handle, which is what releases the device.
        let _ = session.pump_stop.send(true);
        if let Err(err) = session.pump_task.await {
            self.logger.error(format!("audio pump task panicked: {err}"));
        }

        for track in &session.tracks {
            if let Err(err) = session.handle.unpublish_track(track).await {
                self.logger
                    .error(format!("failed to unpublish track {}: {err}", track.sid));
                teardown_error.get_or_insert(err);
            }
        }

        if let Err(err) = session.handle.disconnect().await {
            self.logger.error(format!("failed to close room connection: {err}"));
            teardown_error.get_or_insert(err);
        }

        session.event_task.abort();

        let error_text = teardown_error.as_ref().map(|err| err.to_string());
        self.update(move |s| {
            s.state = ConnectionState::Disconnected;
            s.local_tracks.clear();
            s.connected_at = None;
            if let Some(text) = error_text {
                s.last_error = Some(text);
            }
        });

        match teardown_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn record_failure(&self, err: &VoiceError) {
        let text = err.to_string();
        self.update(move |s| {
            s.state = ConnectionState::Disconnected;
            s.local_tracks.clear();
            s.connected_at = None;
            s.last_error = Some(text);
        });
    }

    fn update(&self, apply: impl FnOnce(&mut SessionSnapshot)) {
        self.snapshot.send_modify(apply);
    }
}

/// Forwards capture frames into the room until stopped, then marks the
/// published stream finished with an empty final frame.
async fn run_audio_pump(
    handle: Arc<dyn RoomHandle>,
    mut capture: CaptureHandle,
    capture_config: CaptureConfig,
    mut stop: watch::Receiver<bool>,
    logger: Arc<Logger>,
) {
    let mut sequence: u32 = 0;

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            maybe = capture.recv() => match maybe {
                Some(frame) => {
                    if let Err(err) = handle.publish_audio(&frame, sequence, false).await {
                        logger.error(format!("failed to publish audio frame: {err}"));
                    }
                    sequence = sequence.wrapping_add(1);
                }
                None => break,
            }
        }
    }

    let final_frame = AudioFrame {
        samples: Vec::new(),
        sample_rate: capture_config.sample_rate,
        channels: capture_config.channels,
        timestamp_ms: 0,
    };
    if let Err(err) = handle.publish_audio(&final_frame, sequence, true).await {
        logger.error(format!("failed to send final frame: {err}"));
    }

    // capture drops here; the broker releases the device if this was the
    // last subscriber.
}

/// Handles every inbound room event for the lifetime of the session.
async fn run_event_loop(
    mut events: mpsc::Receiver<RoomEvent>,
    transcript: Arc<Mutex<Transcript>>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    logger: Arc<Logger>,
) {
    while let Some(event) = events.recv().await {
        match event {
            RoomEvent::Connected => {
                snapshot.send_modify(|s| {
                    if s.state != ConnectionState::Connected {
                        s.state = ConnectionState::Connected;
                    }
                });
            }
            RoomEvent::Disconnected => {
                logger.info("room reported disconnect");
                snapshot.send_modify(|s| {
                    s.state = ConnectionState::Disconnected;
                    s.connected_at = None;
                });
            }
            RoomEvent::TrackSubscribed { sid } => {
                logger.debug(format!("track subscribed: {sid}"));
            }
            RoomEvent::TrackUnsubscribed { sid } => {
                logger.debug(format!("track unsubscribed: {sid}"));
            }
            RoomEvent::ConnectionQualityChanged { quality } => {
                logger.debug(format!("connection quality changed: {quality:?}"));
            }
            RoomEvent::MediaDeviceError { message } => {
                logger.error(format!("media device error: {message}"));
                snapshot.send_modify(|s| s.last_error = Some(message.clone()));
            }
            RoomEvent::DataReceived { payload } => {
                let mut transcript = transcript.lock().await;
                transcript.apply_payload(&payload);
            }
        }
    }
}
