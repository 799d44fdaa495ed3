use crate::upstream::UpstreamError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

/// Why a fetch was deferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryReason {
    RateLimited,
    TransientFailure,
    /// The circuit breaker short-circuited the call
    CircuitOpen,
}

impl RetryReason {
    /// Reason for a retryable upstream error, `None` for terminal ones
    pub fn from_upstream(error: &UpstreamError) -> Option<Self> {
        match error {
            UpstreamError::NotFound => None,
            UpstreamError::RateLimited => Some(RetryReason::RateLimited),
            UpstreamError::TransientFailure(_) => Some(RetryReason::TransientFailure),
        }
    }
}

/// A pending fetch awaiting reprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryRequest {
    pub anime_id: i32,
    pub reason: RetryReason,
    /// Failed attempts so far, including the original fetch
    pub attempts: u32,
    pub first_enqueued_at: DateTime<Utc>,
    pub last_enqueued_at: DateTime<Utc>,
}

impl RetryRequest {
    pub fn new(anime_id: i32, reason: RetryReason) -> Self {
        let now = Utc::now();
        Self {
            anime_id,
            reason,
            attempts: 1,
            first_enqueued_at: now,
            last_enqueued_at: now,
        }
    }

    /// The same request after another failed attempt
    pub fn next_attempt(mut self, reason: RetryReason) -> Self {
        self.attempts = self.attempts.saturating_add(1);
        self.reason = reason;
        self.last_enqueued_at = Utc::now();
        self
    }
}

/// Thread-safe FIFO of pending fetches
#[derive(Debug, Default)]
pub struct RetryQueue {
    inner: Mutex<VecDeque<RetryRequest>>,
}

impl RetryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, request: RetryRequest) {
        warn!(
            anime_id = request.anime_id,
            reason = ?request.reason,
            attempts = request.attempts,
            "Fetch deferred to retry queue"
        );
        self.inner.lock().push_back(request);
    }

    /// Record a first failure for `anime_id`
    pub fn enqueue_key(&self, anime_id: i32, reason: RetryReason) {
        self.enqueue(RetryRequest::new(anime_id, reason));
    }

    /// Put a request back after another failed attempt
    pub fn requeue(&self, request: RetryRequest, reason: RetryReason) {
        self.enqueue(request.next_attempt(reason));
    }

    /// Take every queued request, in enqueue order, leaving the queue empty
    ///
    /// Each request is handed to exactly one caller.
    pub fn drain_snapshot(&self) -> Vec<RetryRequest> {
        let mut inner = self.inner.lock();
        std::mem::take(&mut *inner).into()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Ids currently waiting, in queue order
    pub fn pending_keys(&self) -> Vec<i32> {
        self.inner.lock().iter().map(|r| r.anime_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_preserves_fifo_order_and_empties_queue() {
        let queue = RetryQueue::new();
        queue.enqueue_key(3, RetryReason::RateLimited);
        queue.enqueue_key(1, RetryReason::TransientFailure);
        queue.enqueue_key(2, RetryReason::CircuitOpen);

        let snapshot = queue.drain_snapshot();
        let ids: Vec<i32> = snapshot.iter().map(|r| r.anime_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(queue.is_empty());
        assert!(queue.drain_snapshot().is_empty());
    }

    #[test]
    fn test_items_enqueued_after_snapshot_are_not_in_it() {
        let queue = RetryQueue::new();
        queue.enqueue_key(10, RetryReason::RateLimited);

        let snapshot = queue.drain_snapshot();
        queue.enqueue_key(11, RetryReason::RateLimited);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(queue.pending_keys(), vec![11]);
    }

    #[test]
    fn test_duplicate_keys_allowed() {
        let queue = RetryQueue::new();
        queue.enqueue_key(5, RetryReason::RateLimited);
        queue.enqueue_key(5, RetryReason::RateLimited);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_requeue_increments_attempts() {
        let queue = RetryQueue::new();
        queue.enqueue_key(8, RetryReason::RateLimited);

        let request = queue.drain_snapshot().remove(0);
        let first_enqueued_at = request.first_enqueued_at;
        queue.requeue(request, RetryReason::CircuitOpen);

        let request = queue.drain_snapshot().remove(0);
        assert_eq!(request.attempts, 2);
        assert_eq!(request.reason, RetryReason::CircuitOpen);
        assert_eq!(request.first_enqueued_at, first_enqueued_at);
    }

    #[test]
    fn test_reason_from_upstream() {
        assert_eq!(RetryReason::from_upstream(&UpstreamError::NotFound), None);
        assert_eq!(
            RetryReason::from_upstream(&UpstreamError::RateLimited),
            Some(RetryReason::RateLimited)
        );
        assert_eq!(
            RetryReason::from_upstream(&UpstreamError::TransientFailure("x".into())),
            Some(RetryReason::TransientFailure)
        );
    }
}
