#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Anime Cache
//!
//! Resilient cache-aside fetcher for anime records served by the Jikan API.
//!
//! ## Overview
//!
//! A lookup is served from the record store when possible. On a miss the
//! record is fetched from the upstream through a circuit breaker, stored and
//! returned. When the upstream is rate limiting, failing, or the breaker is
//! open, the caller immediately receives a fallback and the key is queued so
//! a periodic drain can fill the cache later.
//!
//! ## Module Organization
//!
//! - [`models`] - The cached record type
//! - [`store`] - Record store trait with PostgreSQL and in-memory backends
//! - [`upstream`] - Upstream source trait and the Jikan HTTP client
//! - [`resilience`] - Circuit breaker and breaker registry
//! - [`retry`] - Retry queue and the drain scheduler
//! - [`fetch`] - Fetch coordinator tying the pieces together
//! - [`system_context`] - Dependency container built from configuration
//! - [`web`] - axum routes over the coordinator
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anime_cache::config::ConfigManager;
//! use anime_cache::fetch::FetchOutcome;
//! use anime_cache::system_context::SystemContext;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let context = SystemContext::from_config(ConfigManager::load()?).await?;
//!
//! match context.coordinator.fetch_or_cache(42).await? {
//!     FetchOutcome::Found(record) => println!("{:?}", record.title),
//!     FetchOutcome::NotFound => println!("no such anime"),
//!     FetchOutcome::Fallback => println!("try again later"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                  # Unit and integration tests, no database needed
//! cargo test -- --ignored     # PostgreSQL store tests (requires DATABASE_URL)
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod retry;
pub mod store;
pub mod system_context;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;
pub mod upstream;
pub mod web;

pub use config::{AnimeCacheConfig, ConfigManager};
pub use error::{AnimeCacheError, Result};
pub use fetch::{DrainReport, FetchCoordinator, FetchOutcome, FALLBACK_RESPONSE};
pub use models::AnimeRecord;
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{RetryQueue, RetryScheduler};
pub use store::{InMemoryRecordStore, PgRecordStore, PutOutcome, RecordStore};
pub use system_context::SystemContext;
pub use upstream::{JikanClient, UpstreamError, UpstreamSource};
