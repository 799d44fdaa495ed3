//! # Circuit Breaker Implementation
//!
//! Fault isolation for calls to an unreliable dependency. Three states:
//! Closed (normal operation), Open (failing fast), and Half-Open (one trial
//! call tests recovery).
//!
//! ```text
//! Closed   → Open:     consecutive failures reach failure_threshold
//! Open     → HalfOpen: first call after the recovery timeout
//! HalfOpen → Closed:   trial call succeeds (failure count reset)
//! HalfOpen → Open:     trial call fails (recovery clock restarted)
//! ```
//!
//! All state lives behind one mutex so every transition is atomic. The lock
//! is never held while the protected operation runs.

use super::{CircuitBreakerConfig, CircuitBreakerMetrics};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - all calls fail fast without executing
    Open,
    /// Testing recovery - a single trial call is allowed through
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, the operation was not attempted
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation ran and returned an error
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::CircuitOpen { .. })
    }
}

/// Read-only view of a breaker for monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStateSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<DateTime<Utc>>,
    /// When the circuit last entered Open
    opened_at: Option<Instant>,
    /// A HalfOpen trial call has been admitted and not yet completed
    trial_in_flight: bool,
    /// Bumped on every state transition; a trial only applies within its own
    trial_generation: u64,
    metrics: CircuitBreakerMetrics,
}

/// Core circuit breaker implementation
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and monitoring
    name: String,

    config: CircuitBreakerConfig,

    inner: Mutex<BreakerInner>,
}

/// Admission ticket for one call through the breaker
///
/// Dropping a trial permit without completing it frees the HalfOpen slot so
/// the next call becomes the trial. Cancellation says nothing about upstream
/// health, so it is not recorded as a failure.
///
/// A trial permit carries the generation it was admitted in. Once the state
/// has moved on (a forced transition, say) its outcome no longer decides
/// anything.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: Option<u64>,
    completed: bool,
}

impl CallPermit<'_> {
    fn complete(mut self, failed: bool, duration: Duration) {
        self.completed = true;
        self.breaker.record_outcome(self.trial, failed, duration);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if let (Some(generation), false) = (self.trial, self.completed) {
            self.breaker.abandon_trial(generation);
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout.as_secs(),
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure: None,
                opened_at: None,
                trial_in_flight: false,
                trial_generation: 0,
                metrics: CircuitBreakerMetrics::new(),
            }),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    pub fn last_failure(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_failure
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consistent view of mode, failure count and last failure
    pub fn snapshot(&self) -> CircuitStateSnapshot {
        let inner = self.inner.lock();
        CircuitStateSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.consecutive_failures,
            last_failure: inner.last_failure,
        }
    }

    /// Execute an operation with circuit breaker protection
    ///
    /// Every `Err` from the operation counts as a failure.
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_classified(operation, |_| true).await
    }

    /// Execute an operation, letting `trips_breaker` decide which errors count
    ///
    /// Errors for which `trips_breaker` returns `false` are passed through to
    /// the caller but recorded as a success for the state machine.
    pub async fn call_classified<F, T, E, Fut, P>(
        &self,
        operation: F,
        trips_breaker: P,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnOnce(&E) -> bool,
    {
        let Some(permit) = self.acquire_permit() else {
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        };

        let start_time = Instant::now();
        let result = operation().await;
        let duration = start_time.elapsed();

        let failed = match &result {
            Ok(_) => false,
            Err(e) => trips_breaker(e),
        };
        permit.complete(failed, duration);

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Decide whether a call may proceed, transitioning Open → HalfOpen when due
    fn acquire_permit(&self) -> Option<CallPermit<'_>> {
        let mut inner = self.inner.lock();
        let trial = match inner.state {
            CircuitState::Closed => None,
            CircuitState::Open => {
                let recovered = inner
                    .opened_at
                    .map(|opened| opened.elapsed() >= self.config.timeout)
                    .unwrap_or(true);
                if !recovered {
                    inner.metrics.rejected_calls += 1;
                    debug!(component = %self.name, "Circuit open, short-circuiting call");
                    return None;
                }
                self.transition_to_half_open(&mut inner);
                inner.trial_in_flight = true;
                Some(inner.trial_generation)
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    inner.metrics.rejected_calls += 1;
                    debug!(component = %self.name, "Trial call in flight, short-circuiting call");
                    return None;
                }
                inner.trial_in_flight = true;
                Some(inner.trial_generation)
            }
        };

        Some(CallPermit {
            breaker: self,
            trial,
            completed: false,
        })
    }

    fn record_outcome(&self, trial: Option<u64>, failed: bool, duration: Duration) {
        let mut inner = self.inner.lock();
        inner.metrics.total_calls += 1;
        inner.metrics.total_duration += duration;

        if let Some(generation) = trial {
            if !Self::is_current_trial(&inner, generation) {
                if failed {
                    inner.metrics.failure_count += 1;
                } else {
                    inner.metrics.success_count += 1;
                }
                debug!(
                    component = %self.name,
                    state = %inner.state,
                    failed,
                    "Stale trial outcome recorded without state change"
                );
                return;
            }
        }

        if failed {
            inner.metrics.failure_count += 1;
            inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
            inner.last_failure = Some(Utc::now());

            error!(
                component = %self.name,
                duration_ms = duration.as_millis(),
                consecutive_failures = inner.consecutive_failures,
                "🔴 Operation failed"
            );
        } else {
            inner.metrics.success_count += 1;

            debug!(
                component = %self.name,
                duration_ms = duration.as_millis(),
                "🟢 Operation succeeded"
            );
        }

        if trial.is_some() {
            inner.trial_in_flight = false;
            if failed {
                self.transition_to_open(&mut inner);
            } else {
                self.transition_to_closed(&mut inner);
            }
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                if failed {
                    if inner.consecutive_failures >= self.config.failure_threshold {
                        self.transition_to_open(&mut inner);
                    }
                } else {
                    // Re-entering Closed clears the consecutive count
                    inner.consecutive_failures = 0;
                }
            }
            CircuitState::Open | CircuitState::HalfOpen => {
                // Call admitted before the circuit tripped; only the trial decides
                debug!(
                    component = %self.name,
                    state = %inner.state,
                    "Late outcome recorded without state change"
                );
            }
        }
    }

    /// The trial admitted in `generation` still owns the HalfOpen slot
    fn is_current_trial(inner: &BreakerInner, generation: u64) -> bool {
        inner.state == CircuitState::HalfOpen
            && inner.trial_in_flight
            && inner.trial_generation == generation
    }

    fn abandon_trial(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if Self::is_current_trial(&inner, generation) {
            // Stay HalfOpen; the next call becomes the trial
            inner.trial_in_flight = false;
            warn!(component = %self.name, "Trial call abandoned before completion");
        }
    }

    /// Transition to closed state (normal operation)
    fn transition_to_closed(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Closed;
        inner.trial_generation = inner.trial_generation.wrapping_add(1);
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;

        info!(
            component = %self.name,
            total_calls = inner.metrics.total_calls,
            "🟢 Circuit breaker closed (recovered)"
        );
    }

    /// Transition to open state (failing fast)
    fn transition_to_open(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Open;
        inner.trial_generation = inner.trial_generation.wrapping_add(1);
        inner.opened_at = Some(Instant::now());
        inner.trial_in_flight = false;

        error!(
            component = %self.name,
            consecutive_failures = inner.consecutive_failures,
            failure_threshold = self.config.failure_threshold,
            timeout_seconds = self.config.timeout.as_secs(),
            "🔴 Circuit breaker opened (failing fast)"
        );
    }

    /// Transition to half-open state (testing recovery)
    fn transition_to_half_open(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::HalfOpen;
        inner.trial_generation = inner.trial_generation.wrapping_add(1);
        inner.trial_in_flight = false;

        info!(
            component = %self.name,
            "🟡 Circuit breaker half-open (testing recovery)"
        );
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced open");
        let mut inner = self.inner.lock();
        self.transition_to_open(&mut inner);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced closed");
        let mut inner = self.inner.lock();
        self.transition_to_closed(&mut inner);
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        let mut snapshot = inner.metrics.clone();
        snapshot.current_state = inner.state;
        snapshot.consecutive_failures = inner.consecutive_failures;
        snapshot.last_failure = inner.last_failure;
        snapshot.with_derived()
    }

    /// Check if circuit is healthy (closed state with low failure rate)
    pub fn is_healthy(&self) -> bool {
        let inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            return false;
        }

        let metrics = &inner.metrics;
        if metrics.total_calls < 10 {
            // Too few calls to determine health
            return true;
        }

        let failure_rate = metrics.failure_count as f64 / metrics.total_calls as f64;
        failure_rate < 0.1
    }
}
