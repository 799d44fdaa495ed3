//! # Retry Scheduler
//!
//! Background task that triggers one drain cycle per period until stopped.
//! Cycles run inline in the task's loop, so a slow cycle delays the next
//! tick instead of overlapping it; ticks missed meanwhile are skipped.

use crate::fetch::FetchCoordinator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

#[derive(Debug)]
pub struct RetryScheduler {
    period: Duration,
    shutdown_notify: Arc<Notify>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RetryScheduler {
    /// Spawn the drain loop. The first cycle runs one `period` after start.
    pub fn start(coordinator: Arc<FetchCoordinator>, period: Duration) -> Self {
        let shutdown_notify = Arc::new(Notify::new());
        let running = Arc::new(AtomicBool::new(true));

        info!(
            period_seconds = period.as_secs_f64(),
            "⏰ Starting retry scheduler"
        );

        let loop_shutdown = shutdown_notify.clone();
        let loop_running = running.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;

                    _ = loop_shutdown.notified() => {
                        info!("Retry scheduler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        match coordinator.run_drain_cycle().await {
                            Some(report) => debug!(?report, "Drain cycle complete"),
                            None => debug!("Drain cycle skipped, previous cycle still running"),
                        }
                    }
                }
            }

            loop_running.store(false, Ordering::Release);
        });

        Self {
            period,
            shutdown_notify,
            running,
            handle: Some(handle),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signal the loop to stop and wait for it to exit
    ///
    /// A drain cycle already in progress finishes before the loop exits.
    pub async fn stop(&mut self) {
        // notify_one stores a permit, so the signal is not lost mid-cycle
        self.shutdown_notify.notify_one();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Retry scheduler task ended abnormally");
            }
        }
        self.running.store(false, Ordering::Release);
        info!("🛑 Retry scheduler stopped");
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
