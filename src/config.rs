use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub room: RoomConfig,
    pub audio: AudioConfig,
    pub speech: SpeechConfig,
    pub visualizer: VisualizerSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Remote session service endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    /// Server URL, e.g. "nats://localhost:4222"
    pub url: String,
    /// Room joined when a connect request does not name one.
    pub default_room: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_duration_ms: u64,
}

/// Backend speech-processing service reached by the /voice route.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualizerSection {
    pub width: usize,
    pub height: usize,
    pub fft_size: usize,
    pub frame_interval_ms: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "voicelink".to_string(),
                http: HttpConfig {
                    bind: "127.0.0.1".to_string(),
                    port: 3080,
                },
            },
            room: RoomConfig {
                url: "nats://localhost:4222".to_string(),
                default_room: "assistant".to_string(),
            },
            audio: AudioConfig {
                sample_rate: 16000,
                channels: 1,
                buffer_duration_ms: 100,
            },
            speech: SpeechConfig {
                endpoint: "http://localhost:8000/process-audio".to_string(),
            },
            visualizer: VisualizerSection {
                width: 300,
                height: 100,
                fft_size: 256,
                frame_interval_ms: 16,
            },
        }
    }
}
