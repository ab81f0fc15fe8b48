use super::canvas::{Canvas, Gradient, Rgb};
use crate::analysis::SpectrumAnalyzer;
use crate::audio::CaptureBroker;
use crate::logging::Logger;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Canvas clear color: rgb(20, 20, 30)
pub const BACKGROUND: Rgb = Rgb::new(20, 20, 30);
/// Bar gradient, top: #60A5FA (blue-400)
pub const GRADIENT_TOP: Rgb = Rgb::new(0x60, 0xA5, 0xFA);
/// Bar gradient, bottom: #2DD4BF (teal-400)
pub const GRADIENT_BOTTOM: Rgb = Rgb::new(0x2D, 0xD4, 0xBF);

#[derive(Debug, Clone)]
pub struct VisualizerConfig {
    pub width: usize,
    pub height: usize,
    pub fft_size: usize,
    /// Paint cadence; the host animation tick.
    pub frame_interval: Duration,
    pub background: Rgb,
    pub gradient: Gradient,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 100,
            fft_size: 256,
            frame_interval: Duration::from_millis(16),
            background: BACKGROUND,
            gradient: Gradient::new(GRADIENT_TOP, GRADIENT_BOTTOM),
        }
    }
}

/// Self-contained frequency-bar animation loop.
///
/// Driven by a boolean listening flag: activation subscribes to the capture
/// broker and starts the paint loop; deactivation stops the loop, drops the
/// subscription, and discards the analyzer. If capture cannot be opened the
/// failure is logged and the surface stays idle.
pub struct Visualizer {
    broker: Arc<CaptureBroker>,
    logger: Arc<Logger>,
    config: VisualizerConfig,
    canvas: Arc<StdMutex<Canvas>>,
    running: Mutex<Option<PaintLoop>>,
}

struct PaintLoop {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Visualizer {
    pub fn new(broker: Arc<CaptureBroker>, logger: Arc<Logger>, config: VisualizerConfig) -> Self {
        let canvas = Canvas::new(config.width, config.height);
        Self {
            broker,
            logger,
            config,
            canvas: Arc::new(StdMutex::new(canvas)),
            running: Mutex::new(None),
        }
    }

    /// The painted surface. Shared so callers can read it while the loop
    /// runs.
    pub fn canvas(&self) -> Arc<StdMutex<Canvas>> {
        Arc::clone(&self.canvas)
    }

    pub async fn is_listening(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn set_listening(&self, listening: bool) {
        if listening {
            self.start().await;
        } else {
            self.stop().await;
        }
    }

    /// Shutdown path; same as deactivating.
    pub async fn close(&self) {
        self.stop().await;
    }

    async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            // One live paint loop at a time; repeated activation is a no-op.
            return;
        }

        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_paint_loop(
            Arc::clone(&self.broker),
            Arc::clone(&self.canvas),
            self.config.clone(),
            stop_rx,
            Arc::clone(&self.logger),
        ));

        *running = Some(PaintLoop { stop, task });
        self.logger.debug("visualizer activated");
    }

    async fn stop(&self) {
        let Some(paint_loop) = self.running.lock().await.take() else {
            return;
        };

        let _ = paint_loop.stop.send(true);
        if let Err(err) = paint_loop.task.await {
            self.logger.error(format!("paint loop task panicked: {err}"));
        }
        self.logger.debug("visualizer deactivated");
    }
}

async fn run_paint_loop(
    broker: Arc<CaptureBroker>,
    canvas: Arc<StdMutex<Canvas>>,
    config: VisualizerConfig,
    mut stop: watch::Receiver<bool>,
    logger: Arc<Logger>,
) {
    // Stay cancellable while the device opens.
    let mut capture = tokio::select! {
        _ = stop.changed() => return,
        acquired = broker.acquire() => match acquired {
            Ok(capture) => capture,
            Err(err) => {
                // Visualizer failures never surface as errors; the canvas
                // simply stays idle.
                logger.error(format!("visualizer could not open capture: {err}"));
                return;
            }
        }
    };

    let sample_rate = broker.config().sample_rate;
    let mut analyzer = SpectrumAnalyzer::new(config.fft_size, sample_rate);

    let mut ticker = tokio::time::interval(config.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                for frame in capture.drain() {
                    analyzer.push_frame(&frame);
                }
                let bins = analyzer.byte_frequency_data();
                let mut canvas = canvas.lock().expect("canvas mutex poisoned");
                canvas.paint_bars(&bins, config.background, config.gradient);
            }
        }
    }

    // Subscription and analyzer drop here; the broker releases the device
    // if this was the last subscriber.
}
