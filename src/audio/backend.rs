use anyhow::Result;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Device-level processing toggles requested when a capture stream opens.
///
/// These are what the session asks of the device layer when it publishes
/// its track. The user-facing settings store is intentionally not routed
/// here; see `settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Configuration for a capture backend
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (input is decimated if needed)
    pub sample_rate: u32,
    /// Target channel count (1 = mono)
    pub channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
    /// Processing toggles requested from the device
    pub constraints: CaptureConstraints,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz for speech backends
            channels: 1,        // Mono
            buffer_duration_ms: 100,
            constraints: CaptureConstraints::default(),
        }
    }
}

/// Microphone capture backend trait
///
/// The production implementation is `CpalBackend`; tests swap in scripted
/// fakes through `CaptureFactory`.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Creates capture backends on demand for the broker.
pub trait CaptureFactory: Send + Sync {
    fn create(&self, config: CaptureConfig) -> Result<Box<dyn CaptureBackend>>;
}

/// Factory for the cpal microphone backend.
pub struct CpalCaptureFactory;

impl CaptureFactory for CpalCaptureFactory {
    fn create(&self, config: CaptureConfig) -> Result<Box<dyn CaptureBackend>> {
        let backend = super::cpal_backend::CpalBackend::new(config)?;
        Ok(Box::new(backend))
    }
}
