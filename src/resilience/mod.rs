//! # Resilience Module
//!
//! Circuit breaker protection for upstream fetches and the read-only
//! monitoring surface over all named breakers.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use anime_cache::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CircuitBreakerConfig {
//!     failure_threshold: 3,
//!     timeout: Duration::from_secs(60),
//! };
//!
//! let circuit_breaker = CircuitBreaker::new("jikan".to_string(), config);
//!
//! let result = circuit_breaker.call(|| async {
//!     Ok::<&str, String>("success")
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod manager;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState, CircuitStateSnapshot};
pub use config::CircuitBreakerConfig;
pub use manager::CircuitBreakerManager;
pub use metrics::CircuitBreakerMetrics;
