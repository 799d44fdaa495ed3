//! # Health Check Handlers

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::database::health_check;
use crate::resilience::CircuitState;
use crate::web::state::AppState;

/// Basic health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub environment: String,
    pub store: String,
    /// `None` for the in-memory store
    pub database_reachable: Option<bool>,
    pub circuit_state: CircuitState,
    /// Closed with a failure rate under 10%
    pub circuit_healthy: bool,
    pub retry_queue_depth: usize,
    pub uptime_seconds: u64,
}

/// Basic health check endpoint: GET /health
///
/// Reports healthy whenever the process is serving. An open breaker only
/// means lookups are answered with the fallback, and an unreachable database
/// is reported in `database_reachable` without failing the probe.
pub async fn basic_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let context = &state.context;

    let database_reachable = match &context.database_pool {
        Some(pool) => Some(match health_check(pool).await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }),
        None => None,
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: context.config_manager.environment().to_string(),
        store: context.store.store_name().to_string(),
        database_reachable,
        circuit_state: context.breaker.state(),
        circuit_healthy: context.breaker.is_healthy(),
        retry_queue_depth: context.retry_queue.len(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
