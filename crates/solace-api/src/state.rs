//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use solace_chat::ChatbotEngine;
use solace_core::config::SolaceConfig;

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ChatbotEngine>,
    pub config: Arc<SolaceConfig>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<ChatbotEngine>, config: SolaceConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }
}
