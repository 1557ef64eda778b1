use std::time::Duration;

use crate::dispatcher::DispatcherConfig;

/// Tuning for [`crate::EmailService`]
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How long a resolved participant stays cached
    pub directory_cache_ttl: Duration,
    pub dispatcher: DispatcherConfig,
    /// Upper bound for search result pages
    pub max_search_results: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            directory_cache_ttl: Duration::from_secs(300),
            dispatcher: DispatcherConfig::default(),
            max_search_results: 100,
        }
    }
}
