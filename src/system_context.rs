use crate::config::ConfigManager;
use crate::database::{create_pool, DatabaseMigrations};
use crate::error::{AnimeCacheError, Result};
use crate::fetch::FetchCoordinator;
use crate::resilience::{CircuitBreaker, CircuitBreakerManager, CircuitStateSnapshot};
use crate::retry::RetryQueue;
use crate::store::{InMemoryRecordStore, PgRecordStore, RecordStore};
use crate::upstream::{JikanClient, UpstreamSource};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Shared system dependencies and configuration
///
/// Dependency injection container wiring together:
/// - Record store (PostgreSQL or in-memory)
/// - Upstream client
/// - Circuit breaker manager and the breaker guarding the upstream
/// - Retry queue and the fetch coordinator that drains it
pub struct SystemContext {
    /// System instance ID
    pub system_id: Uuid,

    pub config_manager: Arc<ConfigManager>,

    pub store: Arc<dyn RecordStore>,

    pub upstream: Arc<dyn UpstreamSource>,

    pub circuit_breaker_manager: Arc<CircuitBreakerManager>,

    /// Breaker registered under the configured name, shared with the coordinator
    pub breaker: Arc<CircuitBreaker>,

    pub retry_queue: Arc<RetryQueue>,

    pub coordinator: Arc<FetchCoordinator>,

    /// Present only when the store is backed by PostgreSQL
    pub database_pool: Option<PgPool>,
}

impl std::fmt::Debug for SystemContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemContext")
            .field("system_id", &self.system_id)
            .field("config_manager", &"Arc<ConfigManager>")
            .field("store", &self.store.store_name())
            .field("upstream", &self.upstream.source_name())
            .field("breaker", &self.breaker.name())
            .field("retry_queue_depth", &self.retry_queue.len())
            .field(
                "database_pool",
                &self
                    .database_pool
                    .as_ref()
                    .map(|pool| format!("PgPool(size={})", pool.size()))
                    .unwrap_or_else(|| "None".to_string()),
            )
            .finish()
    }
}

impl SystemContext {
    /// Create SystemContext with environment-aware configuration loading
    pub async fn new() -> Result<Self> {
        info!("🔧 Initializing SystemContext with auto-detected environment configuration");

        let config_manager = ConfigManager::load()?;
        Self::from_config(config_manager).await
    }

    /// Create SystemContext from a loaded configuration manager
    ///
    /// A `memory://` database url selects [`InMemoryRecordStore`]; anything
    /// else connects a pool, optionally runs migrations and uses
    /// [`PgRecordStore`].
    pub async fn from_config(config_manager: Arc<ConfigManager>) -> Result<Self> {
        info!(
            environment = %config_manager.environment(),
            "🔧 Initializing SystemContext from configuration"
        );

        let config = config_manager.config();

        let (store, database_pool): (Arc<dyn RecordStore>, Option<PgPool>) =
            if config.database.is_memory() {
                info!("📦 CORE: Using in-memory record store");
                (Arc::new(InMemoryRecordStore::new()), None)
            } else {
                let pool = create_pool(&config.database).await.map_err(|e| {
                    AnimeCacheError::DatabaseError(format!(
                        "Failed to connect to database with config: {e}"
                    ))
                })?;
                info!("✅ CORE: Database connection established from configuration");

                if config.database.run_migrations {
                    DatabaseMigrations::run_all(&pool).await?;
                }

                (Arc::new(PgRecordStore::new(pool.clone())), Some(pool))
            };

        let upstream: Arc<dyn UpstreamSource> = Arc::new(JikanClient::new(&config.upstream)?);

        let circuit_breaker_manager = Arc::new(CircuitBreakerManager::new());
        let breaker = circuit_breaker_manager.get_or_create(
            &config.circuit_breaker.name,
            config.circuit_breaker.to_resilience_config(),
        );
        info!(
            component = %breaker.name(),
            failure_threshold = breaker.config().failure_threshold,
            recovery_timeout_seconds = breaker.config().timeout.as_secs(),
            "🛡️ CORE: Circuit breaker configured for upstream fetches"
        );

        Ok(Self::assemble(
            config_manager,
            store,
            upstream,
            circuit_breaker_manager,
            breaker,
            database_pool,
        ))
    }

    /// Build a context from already-constructed parts
    ///
    /// The breaker is registered with a fresh manager so it shows up in
    /// [`SystemContext::list_circuit_states`].
    pub fn from_parts(
        config_manager: Arc<ConfigManager>,
        store: Arc<dyn RecordStore>,
        upstream: Arc<dyn UpstreamSource>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        let circuit_breaker_manager = Arc::new(CircuitBreakerManager::new());
        circuit_breaker_manager.register(breaker.clone());

        Self::assemble(
            config_manager,
            store,
            upstream,
            circuit_breaker_manager,
            breaker,
            None,
        )
    }

    fn assemble(
        config_manager: Arc<ConfigManager>,
        store: Arc<dyn RecordStore>,
        upstream: Arc<dyn UpstreamSource>,
        circuit_breaker_manager: Arc<CircuitBreakerManager>,
        breaker: Arc<CircuitBreaker>,
        database_pool: Option<PgPool>,
    ) -> Self {
        let retry_queue = Arc::new(RetryQueue::new());
        let coordinator = Arc::new(FetchCoordinator::new(
            store.clone(),
            upstream.clone(),
            breaker.clone(),
            retry_queue.clone(),
        ));

        let system_id = Uuid::new_v4();
        info!(
            system_id = %system_id,
            store = store.store_name(),
            upstream = upstream.source_name(),
            "✅ SystemContext ready"
        );

        Self {
            system_id,
            config_manager,
            store,
            upstream,
            circuit_breaker_manager,
            breaker,
            retry_queue,
            coordinator,
            database_pool,
        }
    }

    /// Read-only view of every registered breaker
    pub fn list_circuit_states(&self) -> Vec<CircuitStateSnapshot> {
        self.circuit_breaker_manager.list_circuit_states()
    }

    /// Close the database pool, if any
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.database_pool {
            pool.close().await;
            info!("Database pool closed");
        }
    }
}
