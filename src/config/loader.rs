//! Configuration Loader
//!
//! Environment-aware configuration loading. Handles file discovery,
//! environment detection and layering of environment variable overrides.

use super::error::{ConfigResult, ConfigurationError};
use super::AnimeCacheConfig;
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Prefix for environment variable overrides (`ANIME_CACHE__DATABASE__URL`)
pub const ENV_PREFIX: &str = "ANIME_CACHE";
const ENV_SEPARATOR: &str = "__";
const BASE_CONFIG_FILE: &str = "anime-cache.toml";

/// Loaded and validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: AnimeCacheConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_env_vars(config_dir, environment, None)
    }

    /// Load configuration using an explicit set of environment variables
    ///
    /// `None` reads the process environment. Supplying a map keeps tests from
    /// mutating global process state.
    pub fn load_with_env_vars(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_vars: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment, env_vars)?;
        config.validate()?;

        info!(
            environment = %environment,
            failure_threshold = config.circuit_breaker.failure_threshold,
            recovery_timeout_seconds = config.circuit_breaker.recovery_timeout_seconds,
            drain_interval_seconds = config.retry.drain_interval_seconds,
            max_connections = config.database.max_connections,
            "⚙️ Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration (tests and embedding callers)
    pub fn from_config(config: AnimeCacheConfig, environment: &str) -> ConfigResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: PathBuf::from("config"),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &AnimeCacheConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
        env_vars: Option<HashMap<String, String>>,
    ) -> ConfigResult<AnimeCacheConfig> {
        let defaults = Config::try_from(&AnimeCacheConfig::default())
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        let base_file = config_directory.join(BASE_CONFIG_FILE);
        let environment_file = config_directory
            .join("environments")
            .join(format!("{environment}.toml"));

        let prefixed_url_key = format!("{ENV_PREFIX}{ENV_SEPARATOR}DATABASE{ENV_SEPARATOR}URL");
        let lookup = |key: &str| match &env_vars {
            Some(vars) => vars.get(key).cloned(),
            None => env::var(key).ok(),
        };
        let database_url_fallback = match lookup(&prefixed_url_key) {
            Some(_) => None,
            None => lookup("DATABASE_URL"),
        };

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(environment_file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env_vars),
            );

        if let Some(url) = database_url_fallback {
            debug!("Using DATABASE_URL for database.url");
            builder = builder
                .set_override("database.url", url)
                .map_err(|e| ConfigurationError::load_error(environment, e))?;
        }

        builder
            .build()
            .map_err(|e| ConfigurationError::load_error(environment, e))?
            .try_deserialize::<AnimeCacheConfig>()
            .map_err(ConfigurationError::deserialize_error)
    }

    fn detect_environment() -> String {
        env::var("ANIME_CACHE_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("ANIME_CACHE_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}
