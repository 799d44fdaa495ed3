//! # Fetch Coordination
//!
//! The read-through fetch algorithm and the caller-visible result type.
//!
//! ```text
//! fetch_or_cache(id)
//!   → RecordStore::get ── hit ──────────────────────────────→ Found
//!   → miss → CircuitBreaker::call_classified(UpstreamSource::fetch)
//!        Ok(record)        → RecordStore::put (conflict ok) → Found
//!        NotFound          ─────────────────────────────────→ NotFound
//!        RateLimited       → RetryQueue::enqueue ───────────→ Fallback
//!        TransientFailure  → RetryQueue::enqueue ───────────→ Fallback
//!        circuit open      → RetryQueue::enqueue ───────────→ Fallback
//! ```
//!
//! The drain cycle reuses the same upstream-classify-store branch, skipping
//! the cache lookup.

pub mod coordinator;

pub use coordinator::{DrainReport, FetchCoordinator, FetchOutcome, FALLBACK_RESPONSE};
