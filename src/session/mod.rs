//! Session lifecycle management
//!
//! This module provides the `SessionManager` abstraction that owns:
//! - Capture acquisition through the shared broker
//! - Room connection and audio track publishing
//! - Inbound room events and transcript collection
//! - Observable connection state and guaranteed teardown

mod manager;
mod state;

pub use manager::SessionManager;
pub use state::{ConnectionState, SessionOptions, SessionSnapshot};
