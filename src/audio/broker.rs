//! Shared ownership of the microphone.
//!
//! The broker is the only component that opens the capture device. Session
//! publishing and visualizer analysis both attach here and receive the same
//! frame stream; the backend starts when the first subscriber attaches and
//! stops when the last `CaptureHandle` is dropped.

use super::backend::{AudioFrame, CaptureConfig, CaptureFactory};
use crate::error::VoiceError;
use crate::logging::Logger;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch, Mutex};

const FANOUT_CAPACITY: usize = 64;

pub struct CaptureBroker {
    factory: Box<dyn CaptureFactory>,
    config: CaptureConfig,
    logger: Arc<Logger>,
    shared: Mutex<Weak<SharedCapture>>,
}

struct SharedCapture {
    sender: broadcast::Sender<AudioFrame>,
    stop: watch::Sender<bool>,
}

impl Drop for SharedCapture {
    fn drop(&mut self) {
        // Last subscriber detached; tell the pump task to stop the backend.
        let _ = self.stop.send(true);
    }
}

/// One subscriber's view of the shared capture stream.
///
/// Dropping the handle detaches the subscriber; the device is released when
/// the final handle goes away.
pub struct CaptureHandle {
    // Keeps the capture alive; the backend stops when the last clone drops.
    _shared: Arc<SharedCapture>,
    frames: broadcast::Receiver<AudioFrame>,
}

impl CaptureHandle {
    /// Receive the next frame, skipping over any the subscriber missed while
    /// lagging. Returns `None` once the capture stream has shut down.
    pub async fn recv(&mut self) -> Option<AudioFrame> {
        loop {
            match self.frames.recv().await {
                Ok(frame) => return Some(frame),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("capture subscriber lagged, skipped {skipped} frames");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Drain whatever frames are immediately available.
    pub fn drain(&mut self) -> Vec<AudioFrame> {
        let mut frames = Vec::new();
        loop {
            match self.frames.try_recv() {
                Ok(frame) => frames.push(frame),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        frames
    }
}

impl CaptureBroker {
    pub fn new(factory: Box<dyn CaptureFactory>, config: CaptureConfig, logger: Arc<Logger>) -> Self {
        Self {
            factory,
            config,
            logger,
            shared: Mutex::new(Weak::new()),
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Attach a subscriber, starting the capture backend if this is the
    /// first one.
    pub async fn acquire(&self) -> Result<CaptureHandle, VoiceError> {
        let mut slot = self.shared.lock().await;

        if let Some(existing) = slot.upgrade() {
            let frames = existing.sender.subscribe();
            self.logger.debug("capture subscriber attached to running stream");
            return Ok(CaptureHandle {
                _shared: existing,
                frames,
            });
        }

        let mut backend = self
            .factory
            .create(self.config.clone())
            .map_err(VoiceError::from_capture)?;
        let mut rx = backend.start().await.map_err(VoiceError::from_capture)?;

        let (sender, _) = broadcast::channel(FANOUT_CAPACITY);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let fanout = sender.clone();
        let logger = Arc::clone(&self.logger);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe = rx.recv() => match maybe {
                        // No receivers is fine; frames are simply discarded.
                        Some(frame) => {
                            let _ = fanout.send(frame);
                        }
                        None => break,
                    },
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            if let Err(err) = backend.stop().await {
                logger.error(format!("failed to stop capture backend: {err:#}"));
            } else {
                logger.debug("capture backend released");
            }
        });

        let shared = Arc::new(SharedCapture {
            sender,
            stop: stop_tx,
        });
        *slot = Arc::downgrade(&shared);

        self.logger.info("capture device acquired");
        let frames = shared.sender.subscribe();
        Ok(CaptureHandle {
            _shared: shared,
            frames,
        })
    }

    /// Number of currently attached subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.shared.lock().await.strong_count()
    }
}
