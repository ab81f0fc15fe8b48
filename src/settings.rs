//! User-adjustable audio-processing settings.
//!
//! These values are a stored preference surface for the UI layer; they are
//! not applied to the live capture constraints (the capture path keeps its
//! own `CaptureConstraints` defaults).

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

pub const MIN_SILENCE_THRESHOLD_DB: i32 = -60;
pub const MAX_SILENCE_THRESHOLD_DB: i32 = -30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub voice_activity_detection: bool,
    pub noise_suppression: bool,
    pub echo_cancellation: bool,
    pub auto_gain_control: bool,
    /// Silence threshold in dB, clamped to -60..=-30.
    pub silence_threshold_db: i32,
    /// Maximum audio duration in milliseconds.
    pub max_audio_duration_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            voice_activity_detection: true,
            noise_suppression: true,
            echo_cancellation: true,
            auto_gain_control: true,
            silence_threshold_db: -45,
            max_audio_duration_ms: 30_000,
        }
    }
}

impl AudioSettings {
    fn clamped(mut self) -> Self {
        self.silence_threshold_db = self
            .silence_threshold_db
            .clamp(MIN_SILENCE_THRESHOLD_DB, MAX_SILENCE_THRESHOLD_DB);
        self
    }
}

/// Shared settings store.
#[derive(Debug, Default)]
pub struct SettingsStore {
    inner: RwLock<AudioSettings>,
}

impl SettingsStore {
    pub fn new(initial: AudioSettings) -> Self {
        Self {
            inner: RwLock::new(initial.clamped()),
        }
    }

    pub fn get(&self) -> AudioSettings {
        self.inner.read().expect("settings lock poisoned").clone()
    }

    /// Replace the stored settings, returning the clamped result.
    pub fn update(&self, settings: AudioSettings) -> AudioSettings {
        let settings = settings.clamped();
        *self.inner.write().expect("settings lock poisoned") = settings.clone();
        settings
    }
}
