//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use achaar_core::config::AchaarConfig;
use achaar_extract::DocumentExtractor;
use achaar_provider::{ChatModel, ChatSetup};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. `model` is
/// `None` when no provider credential is configured; the chat endpoint then
/// answers 503 for every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AchaarConfig>,
    pub model: Option<Arc<dyn ChatModel>>,
    pub extractor: Arc<dyn DocumentExtractor>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: AchaarConfig,
        model: Option<Arc<dyn ChatModel>>,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            model,
            extractor,
            start_time: Instant::now(),
        }
    }

    /// Chat parameters derived from the provider section of the config.
    pub fn chat_setup(&self) -> ChatSetup {
        ChatSetup::from(&self.config.provider)
    }
}
