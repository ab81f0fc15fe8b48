use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use voicelink::audio::{CaptureBroker, CaptureConfig, CpalCaptureFactory};
use voicelink::http::{create_router, AppState};
use voicelink::logging::Logger;
use voicelink::room::NatsRoomService;
use voicelink::session::SessionManager;
use voicelink::settings::SettingsStore;
use voicelink::visualizer::{Visualizer, VisualizerConfig};
use voicelink::Config;

#[derive(Debug, Parser)]
#[command(name = "voicelink", about = "Voice assistant session service")]
struct Args {
    /// Configuration file (without extension, e.g. "config/voicelink")
    #[arg(long, default_value = "config/voicelink")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("voicelink v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Room service: {}", cfg.room.url);
    info!("Speech backend: {}", cfg.speech.endpoint);

    let logger = Arc::new(Logger::default());

    let capture_config = CaptureConfig {
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
        buffer_duration_ms: cfg.audio.buffer_duration_ms,
        ..CaptureConfig::default()
    };
    let broker = Arc::new(CaptureBroker::new(
        Box::new(CpalCaptureFactory),
        capture_config,
        Arc::clone(&logger),
    ));

    let session = Arc::new(SessionManager::new(
        cfg.room.clone(),
        Arc::new(NatsRoomService::new()),
        Arc::clone(&broker),
        Arc::clone(&logger),
    ));

    let visualizer_config = VisualizerConfig {
        width: cfg.visualizer.width,
        height: cfg.visualizer.height,
        fft_size: cfg.visualizer.fft_size,
        frame_interval: Duration::from_millis(cfg.visualizer.frame_interval_ms),
        ..VisualizerConfig::default()
    };
    let visualizer = Arc::new(Visualizer::new(
        Arc::clone(&broker),
        Arc::clone(&logger),
        visualizer_config,
    ));

    let settings = Arc::new(SettingsStore::default());

    let state = AppState::new(
        Arc::clone(&session),
        Arc::clone(&visualizer),
        settings,
        Arc::clone(&logger),
        cfg.speech.endpoint.clone(),
    );
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(session, visualizer, logger))
        .await?;

    Ok(())
}

async fn shutdown(session: Arc<SessionManager>, visualizer: Arc<Visualizer>, logger: Arc<Logger>) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    logger.info("shutdown requested");
    visualizer.close().await;
    session.close().await;
}
