//! # Deferred Retry
//!
//! Retryable upstream failures are not dropped: the fetch path records a
//! [`RetryRequest`] in the [`RetryQueue`], and the [`RetryScheduler`]
//! periodically asks the fetch coordinator to drain it.
//!
//! ## Drain Cycle
//!
//! ```text
//! tick → drain_snapshot() → for each request (FIFO):
//!          success / already cached → gone
//!          NotFound                 → discarded
//!          retryable / circuit open → requeued for the next cycle
//! ```
//!
//! A cycle only processes the snapshot taken when it starts. Requests
//! enqueued while it runs, including its own requeues, wait for the next
//! tick, so one cycle always terminates.
//!
//! The queue lives in process memory; pending requests do not survive a
//! restart.

pub mod queue;
pub mod scheduler;

pub use queue::{RetryQueue, RetryReason, RetryRequest};
pub use scheduler::RetryScheduler;
