//! # Web API Application State

use crate::system_context::SystemContext;
use std::sync::Arc;
use std::time::Instant;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub context: Arc<SystemContext>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(context: Arc<SystemContext>) -> Self {
        Self {
            context,
            started_at: Instant::now(),
        }
    }
}
