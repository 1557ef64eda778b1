use std::sync::Arc;

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;

use courier_core::{ChannelHub, EmailService};
use courier_persist::MongoStore;

use crate::config::Config;

/// Dependency the health endpoint pings
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    async fn ping(&self) -> Result<(), String>;
}

#[async_trait]
impl ReadinessCheck for MongoStore {
    async fn ping(&self) -> Result<(), String> {
        MongoStore::ping(self).await.map_err(|e| e.to_string())
    }
}

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<EmailService>,
    pub hub: Arc<ChannelHub>,
    pub database: Option<Arc<dyn ReadinessCheck>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<EmailService>, hub: Arc<ChannelHub>) -> Self {
        Self {
            config: Arc::new(config),
            service,
            hub,
            database: None,
            metrics: None,
        }
    }

    pub fn with_database(mut self, check: Arc<dyn ReadinessCheck>) -> Self {
        self.database = Some(check);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
