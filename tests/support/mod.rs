// Shared fakes for integration tests: a scripted capture factory and a
// scripted room service, plus an event log for asserting teardown order.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use voicelink::audio::{AudioFrame, CaptureBackend, CaptureConfig, CaptureFactory};
use voicelink::error::VoiceError;
use voicelink::room::{
    LocalTrack, RoomConnection, RoomEvent, RoomHandle, RoomOptions, RoomService,
};

// ============================================================================
// Event log
// ============================================================================

#[derive(Default, Clone)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn index_of(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.index_of(entry).is_some()
    }
}

/// Poll `cond` until it holds or the timeout elapses.
pub async fn wait_until(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

// ============================================================================
// Fake capture
// ============================================================================

#[derive(Default)]
pub struct CaptureCounters {
    pub created: AtomicUsize,
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
    live: AtomicIsize,
    max_live: AtomicIsize,
}

impl CaptureCounters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Highest number of concurrently running backends ever observed.
    pub fn max_live(&self) -> isize {
        self.max_live.load(Ordering::SeqCst)
    }

    fn backend_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
    }

    fn backend_stopped(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct FakeCaptureFactory {
    pub log: EventLog,
    pub counters: Arc<CaptureCounters>,
    fail_next: Mutex<Option<String>>,
}

impl FakeCaptureFactory {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            counters: Arc::new(CaptureCounters::default()),
            fail_next: Mutex::new(None),
        }
    }

    /// Make the next `create` fail with the given message.
    pub fn fail_next_create(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }
}

impl CaptureFactory for FakeCaptureFactory {
    fn create(&self, _config: CaptureConfig) -> anyhow::Result<Box<dyn CaptureBackend>> {
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(anyhow::anyhow!(message));
        }

        let id = self.counters.created.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.push(format!("capture.create#{id}"));
        Ok(Box::new(FakeBackend {
            id,
            log: self.log.clone(),
            counters: Arc::clone(&self.counters),
            running: Arc::new(AtomicBool::new(false)),
        }))
    }
}

pub struct FakeBackend {
    id: usize,
    log: EventLog,
    counters: Arc<CaptureCounters>,
    running: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl CaptureBackend for FakeBackend {
    async fn start(&mut self) -> anyhow::Result<mpsc::Receiver<AudioFrame>> {
        self.running.store(true, Ordering::SeqCst);
        self.counters.backend_started();
        self.log.push(format!("capture.start#{}", self.id));

        let (tx, rx) = mpsc::channel(32);
        let running = Arc::clone(&self.running);
        tokio::spawn(async move {
            let mut timestamp_ms = 0u64;
            while running.load(Ordering::SeqCst) {
                let frame = AudioFrame {
                    samples: vec![1000i16; 160],
                    sample_rate: 16000,
                    channels: 1,
                    timestamp_ms,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
                timestamp_ms += 10;
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.counters.backend_stopped();
        self.log.push(format!("capture.stop#{}", self.id));
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "fake-capture"
    }
}

// ============================================================================
// Fake room service
// ============================================================================

pub struct FakeRoomService {
    pub log: EventLog,
    pub fail_connect: AtomicBool,
    pub fail_publish: AtomicBool,
    pub fail_disconnect: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
    rooms: Mutex<Vec<Arc<FakeRoom>>>,
    next_id: AtomicUsize,
}

impl FakeRoomService {
    pub fn new(log: EventLog) -> Arc<Self> {
        Arc::new(Self {
            log,
            fail_connect: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
            gate: Mutex::new(None),
            rooms: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        })
    }

    /// Stall the next connect until the returned notify fires.
    pub fn install_gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn rooms(&self) -> Vec<Arc<FakeRoom>> {
        self.rooms.lock().unwrap().clone()
    }

    pub fn last_room(&self) -> Arc<FakeRoom> {
        self.rooms
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no room was connected")
    }
}

#[async_trait::async_trait]
impl RoomService for FakeRoomService {
    async fn connect(
        &self,
        _url: &str,
        token: &str,
        options: &RoomOptions,
    ) -> Result<RoomConnection, VoiceError> {
        self.log.push(format!("room.connect:{token}"));

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(VoiceError::connection(format!(
                "simulated connect failure for room '{}'",
                options.room
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (events_tx, events_rx) = mpsc::channel(32);
        let room = Arc::new(FakeRoom {
            id,
            log: self.log.clone(),
            events: events_tx,
            fail_publish: self.fail_publish.load(Ordering::SeqCst),
            fail_disconnect: self.fail_disconnect.load(Ordering::SeqCst),
            published: Mutex::new(Vec::new()),
            audio_frames: AtomicUsize::new(0),
            final_frames: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        });
        self.rooms.lock().unwrap().push(Arc::clone(&room));

        Ok(RoomConnection {
            handle: room,
            events: events_rx,
        })
    }
}

pub struct FakeRoom {
    pub id: usize,
    log: EventLog,
    events: mpsc::Sender<RoomEvent>,
    fail_publish: bool,
    fail_disconnect: bool,
    pub published: Mutex<Vec<String>>,
    pub audio_frames: AtomicUsize,
    pub final_frames: AtomicUsize,
    pub disconnects: AtomicUsize,
}

impl FakeRoom {
    pub async fn send_event(&self, event: RoomEvent) {
        let _ = self.events.send(event).await;
    }

    pub async fn send_data(&self, payload: &[u8]) {
        self.send_event(RoomEvent::DataReceived {
            payload: payload.to_vec(),
        })
        .await;
    }

    pub fn published_tracks(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RoomHandle for FakeRoom {
    async fn publish_track(&self, track: &LocalTrack) -> Result<(), VoiceError> {
        if self.fail_publish {
            return Err(VoiceError::connection("simulated publish failure"));
        }
        self.log.push(format!("room#{}.publish:{}", self.id, track.name));
        self.published.lock().unwrap().push(track.sid.clone());
        Ok(())
    }

    async fn unpublish_track(&self, track: &LocalTrack) -> Result<(), VoiceError> {
        self.log
            .push(format!("room#{}.unpublish:{}", self.id, track.name));
        self.published.lock().unwrap().retain(|sid| sid != &track.sid);
        Ok(())
    }

    async fn publish_audio(
        &self,
        _frame: &AudioFrame,
        _sequence: u32,
        final_frame: bool,
    ) -> Result<(), VoiceError> {
        if final_frame {
            self.final_frames.fetch_add(1, Ordering::SeqCst);
        } else {
            self.audio_frames.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), VoiceError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("room#{}.disconnect", self.id));
        if self.fail_disconnect {
            return Err(VoiceError::connection("simulated disconnect failure"));
        }
        Ok(())
    }
}
