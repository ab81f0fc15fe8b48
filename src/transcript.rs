//! Accumulated transcript text.
//!
//! Fragments arrive asynchronously on the session's data channel as UTF-8
//! JSON with an optional `transcript` field and are appended in arrival
//! order. A payload without that field changes nothing.

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct TranscriptPayload {
    transcript: Option<String>,
}

#[derive(Debug, Default)]
pub struct Transcript {
    fragments: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw data-channel payload. Returns true if a fragment was
    /// added.
    pub fn apply_payload(&mut self, payload: &[u8]) -> bool {
        let payload = match serde_json::from_slice::<TranscriptPayload>(payload) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("ignoring undecodable data payload: {err}");
                return false;
            }
        };

        match payload.transcript {
            Some(fragment) => {
                self.fragments.push(fragment);
                true
            }
            None => false,
        }
    }

    /// Rendered transcript: every fragment prefixed with a separating space,
    /// so an empty transcript grows as `" hello"`, `" hello world"`, ...
    pub fn text(&self) -> String {
        let mut text = String::new();
        for fragment in &self.fragments {
            text.push(' ');
            text.push_str(fragment);
        }
        text
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
