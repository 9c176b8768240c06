use anyhow::Context;
use clap::Parser;

use taskflow_consumer::setup::initialize_app;
use taskflow_core::ConsumerConfig;
use taskflow_infra::{init_telemetry, shutdown_signal, start_server};

/// Claims and completes queued tasks announced by the producer
#[derive(Parser, Debug)]
#[command(name = "taskflow-consumer", version, about)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let _cli = Cli::parse();

    let config = ConsumerConfig::from_env().context("Failed to load consumer configuration")?;

    init_telemetry(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.base.log_format,
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.base.environment,
        production = config.base.is_production(),
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let port = config.base.server_port;
    let (_state, router) = initialize_app(config).await?;

    start_server(port, router, shutdown_signal()).await?;

    Ok(())
}
