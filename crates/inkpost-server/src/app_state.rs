// ABOUTME: Shared application state for the inkpost HTTP server.
// ABOUTME: Holds the store handle and the settings handlers need; built once at startup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use inkpost_core::BlogStore;

use crate::config::InkpostConfig;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub page_size: usize,
    pub static_dir: PathBuf,
    pub request_timeout: Duration,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create a new AppState around an opened store, taking listing and
    /// serving settings from the configuration.
    pub fn new(store: Arc<dyn BlogStore>, config: &InkpostConfig) -> Self {
        Self {
            store,
            page_size: config.page_size.max(1),
            static_dir: config.static_dir.clone(),
            request_timeout: config.request_timeout,
        }
    }
}
