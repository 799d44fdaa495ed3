//! # Scripted Upstream
//!
//! [`UpstreamSource`] whose responses are queued ahead of time. Every call
//! is counted and the requested ids are recorded in order.

use crate::models::AnimeRecord;
use crate::upstream::{UpstreamError, UpstreamSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Callback run at the start of every fetch, before the response is chosen
pub type FetchHook = Box<dyn Fn(i32) + Send + Sync>;

/// Record with predictable titles derived from the id
pub fn sample_record(anime_id: i32) -> AnimeRecord {
    AnimeRecord::new(
        anime_id,
        Some(format!("Anime {anime_id}")),
        Some(format!("Anime {anime_id} (en)")),
        Some(format!("アニメ {anime_id}")),
    )
}

#[derive(Debug, Clone)]
enum DefaultResponse {
    /// Answer with `sample_record(id)`
    Succeed,
    Fail(UpstreamError),
}

pub struct ScriptedUpstream {
    script: Mutex<VecDeque<Result<AnimeRecord, UpstreamError>>>,
    default: Mutex<DefaultResponse>,
    requested: Mutex<Vec<i32>>,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    hook: Mutex<Option<FetchHook>>,
}

impl Default for ScriptedUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedUpstream {
    /// Unscripted calls fail with a transient error
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default: Mutex::new(DefaultResponse::Fail(UpstreamError::TransientFailure(
                "no scripted response".to_string(),
            ))),
            requested: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(None),
            hook: Mutex::new(None),
        }
    }

    pub fn push_ok(&self, record: AnimeRecord) {
        self.script.lock().push_back(Ok(record));
    }

    pub fn push_err(&self, error: UpstreamError) {
        self.script.lock().push_back(Err(error));
    }

    /// Once the script is exhausted, answer every id with `sample_record(id)`
    pub fn succeed_by_default(&self) {
        *self.default.lock() = DefaultResponse::Succeed;
    }

    /// Once the script is exhausted, answer every id with `error`
    pub fn fail_by_default(&self, error: UpstreamError) {
        *self.default.lock() = DefaultResponse::Fail(error);
    }

    /// Sleep this long inside every fetch
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn set_hook(&self, hook: FetchHook) {
        *self.hook.lock() = Some(hook);
    }

    /// Number of times `fetch` was invoked
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ids passed to `fetch`, in call order
    pub fn requested_ids(&self) -> Vec<i32> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl UpstreamSource for ScriptedUpstream {
    async fn fetch(&self, anime_id: i32) -> Result<AnimeRecord, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(anime_id);

        if let Some(hook) = self.hook.lock().as_ref() {
            hook(anime_id);
        }

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(response) => response,
            None => match self.default.lock().clone() {
                DefaultResponse::Succeed => Ok(sample_record(anime_id)),
                DefaultResponse::Fail(error) => Err(error),
            },
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}
