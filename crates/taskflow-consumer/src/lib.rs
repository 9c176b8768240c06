//! Taskflow consumer
//!
//! Serves `POST /consume`: admits the request through a token bucket, claims
//! one matching received task, simulates its work and marks it done.

pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod setup;
pub mod state;
pub mod work;

pub use ledger::ValueLedger;
pub use setup::routes::setup_routes;
pub use state::AppState;
pub use work::{SleepSimulator, WorkSimulator};
