use crate::logging::Logger;
use crate::session::SessionManager;
use crate::settings::SettingsStore;
use crate::visualizer::Visualizer;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
    pub visualizer: Arc<Visualizer>,
    pub settings: Arc<SettingsStore>,
    pub logger: Arc<Logger>,
    /// Client for forwarding audio to the speech backend
    pub http: reqwest::Client,
    pub speech_endpoint: String,
}

impl AppState {
    pub fn new(
        session: Arc<SessionManager>,
        visualizer: Arc<Visualizer>,
        settings: Arc<SettingsStore>,
        logger: Arc<Logger>,
        speech_endpoint: String,
    ) -> Self {
        Self {
            session,
            visualizer,
            settings,
            logger,
            http: reqwest::Client::new(),
            speech_endpoint,
        }
    }
}
