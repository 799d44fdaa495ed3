//! # Upstream Source
//!
//! The only network-facing collaborator. An [`UpstreamSource`] fetches one
//! record by id and classifies the response itself; it performs no caching
//! and no retries.
//!
//! ## Outcome Classification
//!
//! ```text
//! 2xx                  → Ok(AnimeRecord)
//! 404                  → UpstreamError::NotFound          (terminal)
//! 429                  → UpstreamError::RateLimited       (retryable)
//! other status / I/O   → UpstreamError::TransientFailure  (retryable)
//! malformed body       → UpstreamError::TransientFailure  (retryable)
//! ```

pub mod jikan;

use crate::models::AnimeRecord;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use jikan::JikanClient;

/// Failure outcomes of an upstream fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// The upstream answered that the record does not exist
    #[error("Anime not found upstream")]
    NotFound,

    /// The upstream is throttling us
    #[error("Upstream rate limit reached")]
    RateLimited,

    /// Any other failure: unexpected status, transport error, bad payload
    #[error("Transient upstream failure: {0}")]
    TransientFailure(String),
}

impl UpstreamError {
    /// Whether the request should be queued for another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::NotFound => false,
            UpstreamError::RateLimited | UpstreamError::TransientFailure(_) => true,
        }
    }

    /// Whether this outcome counts against the circuit breaker
    ///
    /// A `NotFound` answer comes from a healthy upstream, so it does not.
    pub fn trips_breaker(&self) -> bool {
        self.is_retryable()
    }
}

/// Coarse classification of an HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusClass {
    Success,
    NotFound,
    RateLimited,
    Failure,
}

/// Map a response status onto the outcome taxonomy
pub fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::NOT_FOUND {
        StatusClass::NotFound
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        StatusClass::RateLimited
    } else {
        StatusClass::Failure
    }
}

/// Fetch-by-id contract for the upstream catalogue
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    async fn fetch(&self, anime_id: i32) -> Result<AnimeRecord, UpstreamError>;

    /// Name of the upstream for logs
    fn source_name(&self) -> &'static str;
}
