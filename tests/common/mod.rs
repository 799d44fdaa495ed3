//! Shared fixtures for integration tests

#![allow(dead_code)]

use anime_cache::config::{AnimeCacheConfig, ConfigManager, MEMORY_DATABASE_URL};
use anime_cache::fetch::FetchCoordinator;
use anime_cache::resilience::{CircuitBreaker, CircuitBreakerConfig};
use anime_cache::retry::RetryQueue;
use anime_cache::store::InMemoryRecordStore;
use anime_cache::system_context::SystemContext;
use anime_cache::test_helpers::ScriptedUpstream;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Coordinator over an in-memory store and a scripted upstream
pub struct Harness {
    pub coordinator: Arc<FetchCoordinator>,
    pub store: Arc<InMemoryRecordStore>,
    pub upstream: Arc<ScriptedUpstream>,
    pub breaker: Arc<CircuitBreaker>,
    pub queue: Arc<RetryQueue>,
}

impl Harness {
    pub fn new(failure_threshold: u32, recovery: Duration) -> Self {
        let store = Arc::new(InMemoryRecordStore::new());
        let upstream = Arc::new(ScriptedUpstream::new());
        let breaker = Arc::new(CircuitBreaker::new(
            "integration".to_string(),
            CircuitBreakerConfig {
                failure_threshold,
                timeout: recovery,
            },
        ));
        let queue = Arc::new(RetryQueue::new());
        let coordinator = Arc::new(FetchCoordinator::new(
            store.clone(),
            upstream.clone(),
            breaker.clone(),
            queue.clone(),
        ));

        Self {
            coordinator,
            store,
            upstream,
            breaker,
            queue,
        }
    }

    /// Threshold 3, recovery long enough to never elapse inside a test
    pub fn standard() -> Self {
        Self::new(3, Duration::from_secs(60))
    }
}

pub fn memory_config_manager() -> Arc<ConfigManager> {
    let mut config = AnimeCacheConfig::default();
    config.database.url = MEMORY_DATABASE_URL.to_string();
    ConfigManager::from_config(config, "test").expect("valid test configuration")
}

/// System context over a scripted upstream and an in-memory store
pub fn scripted_context() -> (Arc<SystemContext>, Arc<ScriptedUpstream>, Arc<InMemoryRecordStore>) {
    let store = Arc::new(InMemoryRecordStore::new());
    let upstream = Arc::new(ScriptedUpstream::new());
    let breaker = Arc::new(CircuitBreaker::new(
        "my_circuit".to_string(),
        CircuitBreakerConfig::default(),
    ));
    let context = SystemContext::from_parts(
        memory_config_manager(),
        store.clone(),
        upstream.clone(),
        breaker,
    );
    (Arc::new(context), upstream, store)
}

/// Serve `router` on an ephemeral local port
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    addr
}
