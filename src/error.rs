//! Error types for the anime cache.
//!
//! Component errors (`StoreError`, `UpstreamError`, `CircuitBreakerError`,
//! `ConfigurationError`) stay local to their modules and convert into
//! [`AnimeCacheError`] at the crate boundary.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnimeCacheError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Upstream error: {0}")]
    UpstreamError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for AnimeCacheError {
    fn from(err: sqlx::Error) -> Self {
        AnimeCacheError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AnimeCacheError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AnimeCacheError::DatabaseError(format!("Migration failed: {err}"))
    }
}

impl From<serde_json::Error> for AnimeCacheError {
    fn from(error: serde_json::Error) -> Self {
        AnimeCacheError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<reqwest::Error> for AnimeCacheError {
    fn from(error: reqwest::Error) -> Self {
        AnimeCacheError::UpstreamError(error.to_string())
    }
}

impl From<crate::config::ConfigurationError> for AnimeCacheError {
    fn from(error: crate::config::ConfigurationError) -> Self {
        AnimeCacheError::ConfigurationError(error.to_string())
    }
}

impl From<crate::store::StoreError> for AnimeCacheError {
    fn from(error: crate::store::StoreError) -> Self {
        AnimeCacheError::DatabaseError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnimeCacheError>;
