//! # Database Migrations
//!
//! Schema migrations are embedded at compile time from `migrations/` using a
//! timestamp-based naming convention: `YYYYMMDDHHMMSS_description.sql`.
//! Applying them is idempotent, so both the server and the test harness can
//! call [`DatabaseMigrations::run_all`] unconditionally.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Manages database schema migrations
pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Run all outstanding migrations in order
    pub async fn run_all(pool: &PgPool) -> Result<(), MigrateError> {
        MIGRATOR.run(pool).await?;

        info!(
            migrations = MIGRATOR.iter().count(),
            "✅ Database schema up to date"
        );
        Ok(())
    }
}

/// Apply embedded migrations to `pool`
pub async fn run(pool: &PgPool) -> Result<(), MigrateError> {
    DatabaseMigrations::run_all(pool).await
}
