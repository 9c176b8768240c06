use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;

use taskflow_core::ProducerConfig;
use taskflow_db::{setup_database, PostgresTaskRepository, TaskStore};
use taskflow_infra::{init_telemetry, shutdown_signal, start_server, ProducerMetrics};
use taskflow_producer::{setup_routes, HttpNotifier, Producer, ProducerState};

/// Produces tasks into the shared queue and notifies the consumer
#[derive(Parser, Debug)]
#[command(name = "taskflow-producer", version, about)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let _cli = Cli::parse();

    let config = ProducerConfig::from_env().context("Failed to load producer configuration")?;

    init_telemetry(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.base.log_format,
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let pool = setup_database(&config.base).await?;
    let store: Arc<dyn TaskStore> = Arc::new(PostgresTaskRepository::new(pool));

    let notifier = Arc::new(
        HttpNotifier::new(config.consumer_url.clone(), config.notify_timeout())
            .context("Failed to build consumer notifier")?,
    );
    let metrics = ProducerMetrics::new().context("Failed to register producer metrics")?;

    tracing::info!(
        environment = %config.base.environment,
        production = config.base.is_production(),
        consumer_url = %config.consumer_url,
        max_backlog = config.max_backlog,
        production_rate = config.production_rate,
        "Producer configured"
    );

    let producer = Producer::new(&config, store.clone(), notifier, metrics.clone());
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let producer_handle = tokio::spawn(producer.run(shutdown_rx));

    let state = Arc::new(ProducerState { store, metrics });
    let router = setup_routes(state, &config.base.metrics_endpoint);

    start_server(config.base.server_port, router, async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(()).await;
    })
    .await?;

    producer_handle
        .await
        .context("Producer loop panicked")?;

    Ok(())
}
