pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod room;
pub mod session;
pub mod settings;
pub mod transcript;
pub mod visualizer;

pub use analysis::SpectrumAnalyzer;
pub use audio::{
    AudioFrame, CaptureBackend, CaptureBroker, CaptureConfig, CaptureConstraints, CaptureFactory,
    CaptureHandle, CpalCaptureFactory,
};
pub use config::Config;
pub use error::{ErrorCode, VoiceError};
pub use http::{create_router, AppState};
pub use logging::{LogEntry, LogLevel, Logger};
pub use room::{
    ConnectionQuality, LocalTrack, NatsRoomService, RoomConnection, RoomEvent, RoomHandle,
    RoomOptions, RoomService,
};
pub use session::{ConnectionState, SessionManager, SessionOptions, SessionSnapshot};
pub use settings::{AudioSettings, SettingsStore};
pub use transcript::Transcript;
pub use visualizer::{Canvas, Gradient, Rgb, Visualizer, VisualizerConfig};
