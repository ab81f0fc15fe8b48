//! Microphone capture via cpal.
//!
//! cpal streams are not `Send`, so the stream lives on a dedicated thread
//! for the lifetime of the capture. The device's native format is normalized
//! in the data callback: every sample type is converted to i16, channels are
//! downmixed, the rate is decimated to the target, and full buffers are
//! handed to the async side over an mpsc channel.

use super::backend::{AudioFrame, CaptureBackend, CaptureConfig};
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub struct CpalBackend {
    config: CaptureConfig,
    device_name: String,
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CpalBackend {
    pub fn new(config: CaptureConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no default input device available"))?;
        let device_name = device.name().unwrap_or_else(|_| "unknown input device".to_string());

        info!(
            "Using input device '{}' (echo_cancellation={}, noise_suppression={}, auto_gain_control={})",
            device_name,
            config.constraints.echo_cancellation,
            config.constraints.noise_suppression,
            config.constraints.auto_gain_control
        );

        Ok(Self {
            config,
            device_name,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        })
    }

    fn spawn_capture_thread(
        &self,
        tx: mpsc::Sender<AudioFrame>,
    ) -> std::thread::JoinHandle<()> {
        let running = Arc::clone(&self.running);
        let target = self.config.clone();

        std::thread::spawn(move || {
            if let Err(err) = run_capture(running, target, tx) {
                warn!("microphone capture thread exited with error: {err:#}");
            }
        })
    }
}

#[async_trait::async_trait]
impl CaptureBackend for CpalBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.running.load(Ordering::SeqCst) {
            return Err(anyhow!("capture already started"));
        }

        let (tx, rx) = mpsc::channel(32);
        self.running.store(true, Ordering::SeqCst);
        self.thread = Some(self.spawn_capture_thread(tx));

        info!("Microphone capture started on '{}'", self.device_name);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread.take() {
            tokio::task::spawn_blocking(move || handle.join())
                .await
                .context("capture thread join task failed")?
                .map_err(|_| anyhow!("capture thread panicked"))?;
        }

        info!("Microphone capture stopped on '{}'", self.device_name);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}

/// Converts callback data into fixed-duration target-format frames.
struct FrameAssembler {
    acc: Vec<i16>,
    frame_len: usize,
    device_channels: usize,
    decimation: usize,
    target: CaptureConfig,
    samples_sent: u64,
    tx: mpsc::Sender<AudioFrame>,
}

impl FrameAssembler {
    fn new(device_rate: u32, device_channels: usize, target: CaptureConfig, tx: mpsc::Sender<AudioFrame>) -> Self {
        let frame_len = (target.sample_rate as u64 * target.buffer_duration_ms / 1000) as usize
            * target.channels as usize;
        let decimation = (device_rate / target.sample_rate.max(1)).max(1) as usize;

        Self {
            acc: Vec::with_capacity(frame_len * 2),
            frame_len: frame_len.max(1),
            device_channels: device_channels.max(1),
            decimation,
            target,
            samples_sent: 0,
            tx,
        }
    }

    fn push(&mut self, data: impl Iterator<Item = i16>) {
        let interleaved: Vec<i16> = data.collect();

        // Downmix to mono by averaging across channels, then decimate down to
        // the target rate. The target is always mono speech audio.
        let mono = interleaved.chunks_exact(self.device_channels).map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / self.device_channels as i32) as i16
        });
        self.acc.extend(mono.step_by(self.decimation));

        while self.acc.len() >= self.frame_len {
            let samples: Vec<i16> = self.acc.drain(..self.frame_len).collect();
            let timestamp_ms = self.samples_sent * 1000
                / (self.target.sample_rate as u64 * self.target.channels as u64).max(1);
            self.samples_sent += samples.len() as u64;

            let frame = AudioFrame {
                samples,
                sample_rate: self.target.sample_rate,
                channels: self.target.channels,
                timestamp_ms,
            };

            // Never block the audio callback; drop the frame if the channel
            // is full and the async side has fallen behind.
            if self.tx.try_send(frame).is_err() {
                warn!("audio frame dropped: capture channel full or closed");
            }
        }
    }
}

fn run_capture(
    running: Arc<AtomicBool>,
    target: CaptureConfig,
    tx: mpsc::Sender<AudioFrame>,
) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("no default input device available"))?;

    let default_config = device.default_input_config()?;
    let format = default_config.sample_format();
    let device_config: StreamConfig = default_config.into();
    let device_rate = device_config.sample_rate.0;
    let device_channels = usize::from(device_config.channels.max(1));

    info!(
        "Capture stream: format={format:?} rate={device_rate}Hz channels={device_channels} -> {}Hz mono",
        target.sample_rate
    );

    let mut assembler = FrameAssembler::new(device_rate, device_channels, target, tx);
    let err_fn = |err| warn!("audio stream error: {err}");

    // Convert every supported sample type to i16 up front so the rest of the
    // pipeline stays format-agnostic.
    let stream = match format {
        SampleFormat::F32 => device.build_input_stream(
            &device_config,
            move |data: &[f32], _| {
                assembler.push(data.iter().map(|&s| {
                    (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                }));
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_input_stream(
            &device_config,
            move |data: &[i16], _| {
                assembler.push(data.iter().copied());
            },
            err_fn,
            None,
        )?,
        SampleFormat::U16 => device.build_input_stream(
            &device_config,
            move |data: &[u16], _| {
                assembler.push(data.iter().map(|&s| (s as i32 - 32_768) as i16));
            },
            err_fn,
            None,
        )?,
        other => return Err(anyhow!("unsupported sample format: {other:?}")),
    };

    stream.play().context("failed to start input stream")?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }

    if let Err(err) = stream.pause() {
        warn!("failed to pause input stream: {err}");
    }
    drop(stream);

    Ok(())
}
