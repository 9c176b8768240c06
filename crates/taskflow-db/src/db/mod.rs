//! Task store repositories
//!
//! `store` holds the trait every component talks to; `task` is the PostgreSQL
//! repository and `memory` the in-process one used by tests and local runs.
pub mod memory;
pub mod pool;
pub mod store;
pub mod task;

pub use memory::InMemoryTaskRepository;
pub use pool::{run_migrations, setup_database};
pub use store::TaskStore;
pub use task::PostgresTaskRepository;
