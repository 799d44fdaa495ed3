//! # Circuit Breaker Manager
//!
//! Registry of named circuit breakers. Besides handing out shared breaker
//! instances it is the read-only diagnostic surface behind
//! `GET /circuit_state`: it reports state but offers no way to change it.

use super::{CircuitBreaker, CircuitBreakerConfig, CircuitStateSnapshot};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct CircuitBreakerManager {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the breaker registered under `name`, creating it on first use
    pub fn get_or_create(&self, name: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(component = %name, "Registering circuit breaker");
                Arc::new(CircuitBreaker::new(name.to_string(), config))
            })
            .clone()
    }

    /// Register an existing breaker; replaces any breaker with the same name
    pub fn register(&self, breaker: Arc<CircuitBreaker>) {
        self.breakers.insert(breaker.name().to_string(), breaker);
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Mode, failure count and last failure for every breaker, sorted by name
    pub fn list_circuit_states(&self) -> Vec<CircuitStateSnapshot> {
        let mut states: Vec<CircuitStateSnapshot> = self
            .breakers
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }
}
