//! Application setup and initialization

pub mod routes;

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;

use taskflow_core::ConsumerConfig;
use taskflow_db::{setup_database, PostgresTaskRepository, TaskStore};

use crate::state::AppState;
use crate::work::SleepSimulator;

/// Connect the store and build the router
pub async fn initialize_app(config: ConsumerConfig) -> Result<(Arc<AppState>, Router)> {
    let pool = setup_database(&config.base).await?;
    let store: Arc<dyn TaskStore> = Arc::new(PostgresTaskRepository::new(pool));

    let state = Arc::new(
        AppState::new(config, store, Arc::new(SleepSimulator))
            .context("Failed to build consumer state")?,
    );

    tracing::info!(
        consumption_rate = state.config.consumption_rate,
        burst_limit = state.config.burst_limit,
        "Admission limiter configured"
    );

    let router = routes::setup_routes(state.clone());
    Ok((state, router))
}
