use crate::error::Result;
use crate::models::AnimeRecord;
use crate::resilience::{CircuitBreaker, CircuitBreakerError};
use crate::retry::{RetryQueue, RetryReason};
use crate::store::{PutOutcome, RecordStore, StoreError};
use crate::upstream::{UpstreamError, UpstreamSource};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

/// Fixed value handed to callers when the upstream could not be reached
pub const FALLBACK_RESPONSE: &str = "Fallback response";

/// Caller-visible result of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Record served from the store or freshly fetched and stored
    Found(AnimeRecord),
    /// The upstream reports that the record does not exist
    NotFound,
    /// Upstream unavailable; the request was queued for retry
    Fallback,
}

/// Counts from one drain cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Requests taken from the queue when the cycle started
    pub snapshot_size: usize,
    pub stored: usize,
    pub already_cached: usize,
    /// Dropped because the upstream answered NotFound
    pub discarded: usize,
    pub requeued: usize,
    /// Dropped because the store write failed
    pub persistence_failures: usize,
}

/// Result of the upstream branch shared by foreground fetches and drains
#[derive(Debug)]
enum UpstreamOutcome {
    Stored { record: AnimeRecord, put: PutOutcome },
    NotFound,
    Deferred(RetryReason),
}

/// Orchestrates store, breaker, upstream and retry queue
pub struct FetchCoordinator {
    store: Arc<dyn RecordStore>,
    upstream: Arc<dyn UpstreamSource>,
    breaker: Arc<CircuitBreaker>,
    retry_queue: Arc<RetryQueue>,
    /// Held for the duration of a drain cycle
    drain_lock: Mutex<()>,
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("store", &self.store.store_name())
            .field("upstream", &self.upstream.source_name())
            .field("breaker", &self.breaker.name())
            .field("retry_queue_depth", &self.retry_queue.len())
            .finish()
    }
}

impl FetchCoordinator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        upstream: Arc<dyn UpstreamSource>,
        breaker: Arc<CircuitBreaker>,
        retry_queue: Arc<RetryQueue>,
    ) -> Self {
        Self {
            store,
            upstream,
            breaker,
            retry_queue,
            drain_lock: Mutex::new(()),
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn retry_queue(&self) -> &Arc<RetryQueue> {
        &self.retry_queue
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Serve `anime_id` from the store, falling back to a gated upstream fetch
    ///
    /// A cache hit never consults the breaker or the network. The only error
    /// returned is a persistence failure; every upstream condition is folded
    /// into [`FetchOutcome`].
    #[instrument(skip(self))]
    pub async fn fetch_or_cache(&self, anime_id: i32) -> Result<FetchOutcome> {
        match self.store.get(anime_id).await {
            Ok(Some(record)) => {
                debug!(anime_id, "In cache");
                return Ok(FetchOutcome::Found(record));
            }
            Ok(None) => {}
            Err(e) => {
                error!(anime_id, error = %e, "Record store lookup failed");
                return Err(e.into());
            }
        }

        match self.fetch_and_store(anime_id).await {
            Ok(UpstreamOutcome::Stored { record, .. }) => Ok(FetchOutcome::Found(record)),
            Ok(UpstreamOutcome::NotFound) => Ok(FetchOutcome::NotFound),
            Ok(UpstreamOutcome::Deferred(reason)) => {
                self.retry_queue.enqueue_key(anime_id, reason);
                Ok(FetchOutcome::Fallback)
            }
            Err(e) => {
                error!(anime_id, error = %e, "Failed to cache fetched record");
                Err(e.into())
            }
        }
    }

    /// Process one snapshot of the retry queue
    ///
    /// Returns `None` without touching the queue when another cycle is
    /// already running.
    pub async fn run_drain_cycle(&self) -> Option<DrainReport> {
        let Ok(_cycle) = self.drain_lock.try_lock() else {
            debug!("Drain cycle already in progress, skipping");
            return None;
        };

        let snapshot = self.retry_queue.drain_snapshot();
        let mut report = DrainReport {
            snapshot_size: snapshot.len(),
            ..DrainReport::default()
        };

        if snapshot.is_empty() {
            debug!("Retry queue empty, nothing to drain");
            return Some(report);
        }

        info!(queue_size = snapshot.len(), "🔄 Executing enqueued requests");

        for request in snapshot {
            let anime_id = request.anime_id;
            match self.fetch_and_store(anime_id).await {
                Ok(UpstreamOutcome::Stored { put, .. }) => match put {
                    PutOutcome::Inserted => report.stored += 1,
                    PutOutcome::AlreadyPresent => report.already_cached += 1,
                },
                Ok(UpstreamOutcome::NotFound) => {
                    info!(anime_id, "Anime not found upstream, dropping retry");
                    report.discarded += 1;
                }
                Ok(UpstreamOutcome::Deferred(reason)) => {
                    self.retry_queue.requeue(request, reason);
                    report.requeued += 1;
                }
                Err(e) => {
                    error!(
                        anime_id,
                        attempts = request.attempts,
                        error = %e,
                        "Persistence failure while draining retry, request dropped"
                    );
                    report.persistence_failures += 1;
                }
            }
        }

        info!(
            processed = report.snapshot_size,
            stored = report.stored,
            already_cached = report.already_cached,
            discarded = report.discarded,
            requeued = report.requeued,
            persistence_failures = report.persistence_failures,
            "✅ Finished executing enqueued requests"
        );

        Some(report)
    }

    /// Gated upstream call, classification and store write
    async fn fetch_and_store(
        &self,
        anime_id: i32,
    ) -> std::result::Result<UpstreamOutcome, StoreError> {
        let result = self
            .breaker
            .call_classified(
                || self.upstream.fetch(anime_id),
                UpstreamError::trips_breaker,
            )
            .await;

        match result {
            Ok(record) => {
                let put = self.store.put(&record).await?;
                debug!(anime_id, outcome = ?put, "Record cached");
                Ok(UpstreamOutcome::Stored { record, put })
            }
            Err(CircuitBreakerError::CircuitOpen { .. }) => {
                debug!(anime_id, "Circuit open, deferring fetch");
                Ok(UpstreamOutcome::Deferred(RetryReason::CircuitOpen))
            }
            Err(CircuitBreakerError::OperationFailed(err)) => {
                match RetryReason::from_upstream(&err) {
                    Some(reason) => Ok(UpstreamOutcome::Deferred(reason)),
                    None => Ok(UpstreamOutcome::NotFound),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{CircuitBreakerConfig, CircuitState};
    use crate::store::{InMemoryRecordStore, StoreResult};
    use crate::test_helpers::{sample_record, ScriptedUpstream};
    use async_trait::async_trait;
    use std::time::Duration;

    fn coordinator_with(
        store: Arc<dyn RecordStore>,
        upstream: Arc<ScriptedUpstream>,
        failure_threshold: u32,
    ) -> FetchCoordinator {
        let breaker = Arc::new(CircuitBreaker::new(
            "test".to_string(),
            CircuitBreakerConfig {
                failure_threshold,
                timeout: Duration::from_secs(60),
            },
        ));
        FetchCoordinator::new(store, upstream, breaker, Arc::new(RetryQueue::new()))
    }

    /// Store whose reads work but whose writes always fail
    struct FailingWriteStore;

    #[async_trait]
    impl RecordStore for FailingWriteStore {
        async fn get(&self, _anime_id: i32) -> StoreResult<Option<AnimeRecord>> {
            Ok(None)
        }

        async fn put(&self, _record: &AnimeRecord) -> StoreResult<PutOutcome> {
            Err(StoreError::Persistence("disk full".to_string()))
        }

        fn store_name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream_and_breaker() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.put(&sample_record(1)).await.unwrap();
        let upstream = Arc::new(ScriptedUpstream::new());
        let coordinator = coordinator_with(store, upstream.clone(), 3);

        let outcome = coordinator.fetch_or_cache(1).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Found(sample_record(1)));
        assert_eq!(upstream.calls(), 0);
        assert_eq!(coordinator.breaker().metrics().total_calls, 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let store = Arc::new(InMemoryRecordStore::new());
        let upstream = Arc::new(ScriptedUpstream::new());
        upstream.push_ok(sample_record(2));
        let coordinator = coordinator_with(store.clone(), upstream.clone(), 3);

        let outcome = coordinator.fetch_or_cache(2).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Found(sample_record(2)));
        assert_eq!(store.get(2).await.unwrap(), Some(sample_record(2)));
        assert!(coordinator.retry_queue().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried_and_does_not_trip() {
        let store = Arc::new(InMemoryRecordStore::new());
        let upstream = Arc::new(ScriptedUpstream::new());
        upstream.push_err(UpstreamError::NotFound);
        let coordinator = coordinator_with(store, upstream, 1);

        let outcome = coordinator.fetch_or_cache(3).await.unwrap();

        assert_eq!(outcome, FetchOutcome::NotFound);
        assert!(coordinator.retry_queue().is_empty());
        assert_eq!(coordinator.breaker().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_transient_failure_enqueues_and_falls_back() {
        let store = Arc::new(InMemoryRecordStore::new());
        let upstream = Arc::new(ScriptedUpstream::new());
        upstream.push_err(UpstreamError::TransientFailure("502".to_string()));
        let coordinator = coordinator_with(store, upstream, 3);

        let outcome = coordinator.fetch_or_cache(4).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Fallback);
        assert_eq!(coordinator.retry_queue().pending_keys(), vec![4]);
        assert_eq!(coordinator.breaker().failure_count(), 1);
    }

    #[tokio::test]
    async fn test_open_circuit_enqueues_without_calling_upstream() {
        let store = Arc::new(InMemoryRecordStore::new());
        let upstream = Arc::new(ScriptedUpstream::new());
        let coordinator = coordinator_with(store, upstream.clone(), 3);
        coordinator.breaker().force_open();

        let outcome = coordinator.fetch_or_cache(5).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Fallback);
        assert_eq!(upstream.calls(), 0);
        let pending = coordinator.retry_queue().drain_snapshot();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reason, RetryReason::CircuitOpen);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_surfaced_not_queued() {
        let upstream = Arc::new(ScriptedUpstream::new());
        upstream.push_ok(sample_record(6));
        let coordinator = coordinator_with(Arc::new(FailingWriteStore), upstream, 3);

        let result = coordinator.fetch_or_cache(6).await;

        assert!(matches!(
            result,
            Err(crate::error::AnimeCacheError::DatabaseError(_))
        ));
        assert!(coordinator.retry_queue().is_empty());
    }

    #[tokio::test]
    async fn test_drain_outcomes() {
        let store = Arc::new(InMemoryRecordStore::new());
        let upstream = Arc::new(ScriptedUpstream::new());
        let coordinator = coordinator_with(store.clone(), upstream.clone(), 10);
        let queue = coordinator.retry_queue();
        queue.enqueue_key(10, RetryReason::RateLimited);
        queue.enqueue_key(11, RetryReason::RateLimited);
        queue.enqueue_key(12, RetryReason::RateLimited);

        upstream.push_ok(sample_record(10));
        upstream.push_err(UpstreamError::NotFound);
        upstream.push_err(UpstreamError::RateLimited);

        let report = coordinator.run_drain_cycle().await.unwrap();

        assert_eq!(report.snapshot_size, 3);
        assert_eq!(report.stored, 1);
        assert_eq!(report.discarded, 1);
        assert_eq!(report.requeued, 1);
        assert_eq!(upstream.requested_ids(), vec![10, 11, 12]);
        assert_eq!(queue.pending_keys(), vec![12]);
        assert!(store.get(10).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drain_on_empty_queue() {
        let store = Arc::new(InMemoryRecordStore::new());
        let upstream = Arc::new(ScriptedUpstream::new());
        let coordinator = coordinator_with(store, upstream.clone(), 3);

        let report = coordinator.run_drain_cycle().await.unwrap();
        assert_eq!(report, DrainReport::default());
        assert_eq!(upstream.calls(), 0);
    }
}
