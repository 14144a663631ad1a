//! Background job scheduler and job implementations.

mod pool_metrics;
mod realtime_prune;
mod scheduler;

pub use pool_metrics::PoolMetricsJob;
pub use realtime_prune::RealtimePruneJob;
pub use scheduler::{Job, JobScheduler};
