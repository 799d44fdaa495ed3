//! # Diagnostic Handlers
//!
//! Read-only views of breaker and retry queue state. Nothing here mutates
//! the core.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::resilience::CircuitStateSnapshot;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct CircuitStateResponse {
    pub circuits: Vec<CircuitStateSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct RetryQueueResponse {
    pub pending: Vec<i32>,
}

/// GET /circuit_state
pub async fn circuit_state(State(state): State<AppState>) -> Json<CircuitStateResponse> {
    Json(CircuitStateResponse {
        circuits: state.context.list_circuit_states(),
    })
}

/// GET /retry_queue
pub async fn retry_queue(State(state): State<AppState>) -> Json<RetryQueueResponse> {
    Json(RetryQueueResponse {
        pending: state.context.retry_queue.pending_keys(),
    })
}
