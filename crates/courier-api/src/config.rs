use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use courier_core::{DispatcherConfig, ServiceConfig};
use courier_storage::S3Settings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub storage: StorageConfig,
    pub delivery: DeliveryConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub storage_access_key_id: String,
    #[serde(default)]
    pub storage_secret_access_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
    #[serde(default)]
    pub ensure_indexes: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Empty for AWS S3, the account endpoint for R2
    #[serde(default)]
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    #[serde(default)]
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    pub directory_cache_ttl_secs: u64,
    pub dispatch_workers: usize,
    pub dispatch_queue_capacity: usize,
    pub job_timeout_ms: u64,
    pub scheduler_poll_interval_ms: u64,
    pub scheduler_batch_size: usize,
    #[serde(default = "default_scheduler_lease")]
    pub scheduler_lease_secs: u64,
    pub live_channel_capacity: usize,
    pub max_search_results: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_scheduler_lease() -> u64 {
    300
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. COURIER_<SECTION>__<KEY> environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("COURIER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.mongodb_uri = std::env::var("MONGODB_URI")
            .map_err(|_| ConfigError::Message("MONGODB_URI environment variable is required".to_string()))?;
        cfg.storage_access_key_id = std::env::var("STORAGE_ACCESS_KEY_ID").unwrap_or_default();
        cfg.storage_secret_access_key = std::env::var("STORAGE_SECRET_ACCESS_KEY").unwrap_or_default();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            directory_cache_ttl: Duration::from_secs(self.delivery.directory_cache_ttl_secs),
            dispatcher: DispatcherConfig {
                workers: self.delivery.dispatch_workers,
                queue_capacity: self.delivery.dispatch_queue_capacity,
                job_timeout: Duration::from_millis(self.delivery.job_timeout_ms),
            },
            max_search_results: self.delivery.max_search_results,
        }
    }

    pub fn storage_settings(&self) -> S3Settings {
        S3Settings {
            endpoint: self.storage.endpoint.clone(),
            region: self.storage.region.clone(),
            bucket: self.storage.bucket.clone(),
            access_key_id: self.storage_access_key_id.clone(),
            secret_access_key: self.storage_secret_access_key.clone(),
            force_path_style: self.storage.force_path_style,
        }
    }

    pub fn scheduler_poll_interval(&self) -> Duration {
        Duration::from_millis(self.delivery.scheduler_poll_interval_ms)
    }

    pub fn scheduler_lease(&self) -> Duration {
        Duration::from_secs(self.delivery.scheduler_lease_secs)
    }
}
