//! # Web API
//!
//! Thin axum adapter over [`FetchCoordinator`](crate::fetch::FetchCoordinator)
//! and the diagnostic views of [`SystemContext`].
//!
//! ## Routes
//!
//! - `GET /get_anime/{anime_id}` - cache-aside fetch
//! - `GET /circuit_state` - read-only breaker snapshots
//! - `GET /retry_queue` - keys waiting for a drain cycle
//! - `GET /health` - liveness plus queue depth

pub mod handlers;
pub mod state;

use crate::system_context::SystemContext;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

pub use state::AppState;

/// Build the application router over a shared context
pub fn router(context: Arc<SystemContext>) -> Router {
    Router::new()
        .route("/get_anime/{anime_id}", get(handlers::anime::get_anime))
        .route("/circuit_state", get(handlers::circuit::circuit_state))
        .route("/retry_queue", get(handlers::circuit::retry_queue))
        .route("/health", get(handlers::health::basic_health))
        .with_state(AppState::new(context))
}
