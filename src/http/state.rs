//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::engine::ScheduleEngine;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for persistence operations
    pub repository: Arc<dyn FullRepository>,
    /// Engine facade wrapping the same repository
    pub engine: ScheduleEngine,
}

impl AppState {
    /// Create application state with the standard rule table and default
    /// engine configuration.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        let engine = ScheduleEngine::with_defaults(Arc::clone(&repository));
        Self { repository, engine }
    }

    /// Create application state with an explicit engine.
    pub fn with_engine(repository: Arc<dyn FullRepository>, engine: ScheduleEngine) -> Self {
        Self { repository, engine }
    }
}
