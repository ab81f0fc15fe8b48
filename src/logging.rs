//! In-process log history.
//!
//! `Logger` is an injected capability, constructed once in `main` and handed
//! as `Arc<Logger>` to the components that need it. Every call is mirrored to
//! `tracing` for normal log output and appended to an owned bounded ring
//! buffer so the HTTP API can serve recent history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

pub struct Logger {
    max_entries: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl Logger {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Debug => debug!("{message}"),
            LogLevel::Info => info!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }

        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message,
        };

        let mut entries = self.entries.lock().expect("logger mutex poisoned");
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    /// Snapshot of the retained history, oldest first.
    pub fn recent(&self) -> Vec<LogEntry> {
        let entries = self.entries.lock().expect("logger mutex poisoned");
        entries.iter().cloned().collect()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("logger mutex poisoned");
        entries.clear();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
