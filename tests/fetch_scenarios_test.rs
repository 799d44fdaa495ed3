//! End-to-end fetch behaviour over the in-memory store

mod common;

use anime_cache::fetch::FetchOutcome;
use anime_cache::models::AnimeRecord;
use anime_cache::retry::RetryReason;
use anime_cache::store::RecordStore;
use anime_cache::test_helpers::sample_record;
use anime_cache::upstream::UpstreamError;
use common::Harness;

fn titled(id: i32) -> AnimeRecord {
    AnimeRecord::new(
        id,
        Some("A".to_string()),
        Some("A-en".to_string()),
        Some("A-jp".to_string()),
    )
}

#[tokio::test]
async fn test_cached_key_never_reaches_upstream() {
    let harness = Harness::standard();
    harness.store.put(&sample_record(7)).await.unwrap();
    harness.breaker.force_open();

    for _ in 0..3 {
        let outcome = harness.coordinator.fetch_or_cache(7).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Found(sample_record(7)));
    }

    assert_eq!(harness.upstream.calls(), 0);
}

#[tokio::test]
async fn test_success_is_stored_and_returned() {
    let harness = Harness::standard();
    harness.upstream.push_ok(titled(42));

    let outcome = harness.coordinator.fetch_or_cache(42).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Found(titled(42)));
    assert_eq!(harness.store.get(42).await.unwrap(), Some(titled(42)));
    assert!(harness.queue.is_empty());
}

#[tokio::test]
async fn test_rate_limited_falls_back_and_drain_recovers() {
    let harness = Harness::standard();
    harness.upstream.push_err(UpstreamError::RateLimited);

    let outcome = harness.coordinator.fetch_or_cache(43).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Fallback);
    assert_eq!(harness.queue.pending_keys(), vec![43]);

    harness.upstream.succeed_by_default();
    let report = harness.coordinator.run_drain_cycle().await.unwrap();

    assert_eq!(report.snapshot_size, 1);
    assert_eq!(report.stored, 1);
    assert!(harness.queue.is_empty());
    assert_eq!(harness.store.get(43).await.unwrap(), Some(sample_record(43)));
}

#[tokio::test]
async fn test_not_found_is_terminal() {
    let harness = Harness::standard();
    harness.upstream.push_err(UpstreamError::NotFound);

    let outcome = harness.coordinator.fetch_or_cache(44).await.unwrap();

    assert_eq!(outcome, FetchOutcome::NotFound);
    assert!(harness.queue.is_empty());
    assert!(harness.store.get(44).await.unwrap().is_none());
    assert_eq!(harness.breaker.failure_count(), 0);
}

#[tokio::test]
async fn test_rate_limited_enqueues_exactly_one_request() {
    let harness = Harness::standard();
    harness.upstream.push_err(UpstreamError::RateLimited);

    harness.coordinator.fetch_or_cache(5).await.unwrap();

    let snapshot = harness.queue.drain_snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].anime_id, 5);
    assert_eq!(snapshot[0].reason, RetryReason::RateLimited);
    assert_eq!(snapshot[0].attempts, 1);
}

#[tokio::test]
async fn test_transient_failure_falls_back() {
    let harness = Harness::standard();
    harness
        .upstream
        .push_err(UpstreamError::TransientFailure("502 Bad Gateway".to_string()));

    let outcome = harness.coordinator.fetch_or_cache(9).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Fallback);
    assert_eq!(harness.queue.pending_keys(), vec![9]);
    assert_eq!(harness.breaker.failure_count(), 1);
}

#[tokio::test]
async fn test_concurrent_misses_for_same_key_store_once() {
    let harness = Harness::standard();
    harness.upstream.succeed_by_default();

    let (a, b) = tokio::join!(
        harness.coordinator.fetch_or_cache(11),
        harness.coordinator.fetch_or_cache(11)
    );

    assert_eq!(a.unwrap(), FetchOutcome::Found(sample_record(11)));
    assert_eq!(b.unwrap(), FetchOutcome::Found(sample_record(11)));
    assert_eq!(harness.store.len(), 1);
}
