//! Shared application state.

use std::sync::Arc;

use todo_ai_common::CapabilitySnapshot;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::engine::ModelRegistry;

/// Shared application state passed to all handlers.
///
/// Everything here is built before the server starts and is read-only
/// afterwards.
pub struct AppState {
    pub snapshot: CapabilitySnapshot,
    pub registry: Arc<ModelRegistry>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: &Config, snapshot: CapabilitySnapshot, registry: Arc<ModelRegistry>) -> Self {
        Self {
            snapshot,
            registry,
            dispatcher: Dispatcher::from_config(&config.server),
        }
    }
}
