use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier_api::{build_router, config::Config, state::AppState};
use courier_core::{ChannelHub, EmailService, EmailServiceDeps, ScheduledDeliveryWorker};
use courier_persist::MongoStore;
use courier_storage::S3ObjectStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Courier API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;
    courier_core::telemetry::describe();

    tracing::info!("Connecting to MongoDB");
    let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb.database).await?;
    if config.mongodb.ensure_indexes {
        store.ensure_indexes().await?;
        tracing::info!("MongoDB indexes ensured");
    }
    tracing::info!("MongoDB connected");

    tracing::info!(bucket = %config.storage.bucket, "Connecting to object storage");
    let objects = S3ObjectStore::connect(config.storage_settings()).await?;

    let hub = Arc::new(ChannelHub::new(config.delivery.live_channel_capacity));
    let store = Arc::new(store);

    let deps = EmailServiceDeps {
        store: store.clone(),
        directory: store.clone(),
        search: store.clone(),
        notifier: hub.clone(),
        tasks: store.clone(),
        objects: Arc::new(objects),
    };
    let service = Arc::new(EmailService::new(deps, config.service_config()));

    // Scheduled delivery
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = ScheduledDeliveryWorker::new(
        service.clone(),
        config.scheduler_poll_interval(),
        config.delivery.scheduler_batch_size,
    )
    .with_lease(config.scheduler_lease())
    .spawn(shutdown_rx);

    let state = Arc::new(
        AppState::new(config.clone(), service.clone(), hub)
            .with_database(store)
            .with_metrics(metrics_handle),
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Draining background work");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Scheduled delivery worker panicked");
    }
    service.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
