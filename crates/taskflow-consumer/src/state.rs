use std::sync::Arc;

use taskflow_core::{AppError, ConsumerConfig};
use taskflow_db::TaskStore;
use taskflow_infra::{ConsumerMetrics, RateLimiter};

use crate::ledger::ValueLedger;
use crate::work::WorkSimulator;

/// Everything a consume request touches. Built once at startup.
pub struct AppState {
    pub config: ConsumerConfig,
    pub store: Arc<dyn TaskStore>,
    pub limiter: RateLimiter,
    pub metrics: ConsumerMetrics,
    pub ledger: ValueLedger,
    pub work: Arc<dyn WorkSimulator>,
}

impl AppState {
    pub fn new(
        config: ConsumerConfig,
        store: Arc<dyn TaskStore>,
        work: Arc<dyn WorkSimulator>,
    ) -> Result<Self, AppError> {
        let limiter = RateLimiter::new(config.consumption_rate, config.burst_limit);
        let metrics = ConsumerMetrics::new()?;

        Ok(Self {
            config,
            store,
            limiter,
            metrics,
            ledger: ValueLedger::new(),
            work,
        })
    }
}
