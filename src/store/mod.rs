//! # Record Store
//!
//! Durable key-value storage for [`AnimeRecord`]s, the cache-aside target of
//! the fetch path.
//!
//! - [`PgRecordStore`] - PostgreSQL `anime` table via SQLx
//! - [`InMemoryRecordStore`] - process-local store for tests and
//!   database-less runs
//!
//! Writes are insert-only. Writing a key that already exists reports
//! [`PutOutcome::AlreadyPresent`]; callers treat that exactly like a
//! successful insert.

pub mod memory;
pub mod postgres;

use crate::models::AnimeRecord;
use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

/// Errors that can occur during store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store failed to read or write
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of an insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new row was written
    Inserted,
    /// A row for this id already existed and was left untouched
    AlreadyPresent,
}

/// Storage operations required by the fetch path
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a record by id. `Ok(None)` is a cache miss.
    async fn get(&self, anime_id: i32) -> StoreResult<Option<AnimeRecord>>;

    /// Insert a record unless one already exists for its id
    async fn put(&self, record: &AnimeRecord) -> StoreResult<PutOutcome>;

    /// Name of the backing store for logs and health output
    fn store_name(&self) -> &'static str;
}
