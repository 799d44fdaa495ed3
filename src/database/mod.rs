//! # Database Operations
//!
//! PostgreSQL plumbing for the record store.
//!
//! ## Key Components
//!
//! - [`connection`] - Pooled connection setup and health checks
//! - [`migrations`] - Embedded schema migrations for the `anime` table
//!
//! Foreground fetches and the background retry drain share one
//! [`sqlx::PgPool`], so every concurrent operation checks out its own
//! connection.

pub mod connection;
pub mod migrations;

pub use connection::{create_pool, health_check};
pub use migrations::DatabaseMigrations;
