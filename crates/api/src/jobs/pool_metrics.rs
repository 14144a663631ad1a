//! Publishes connection pool gauges.

use std::time::Duration;

use persistence::metrics::PoolSnapshot;
use sqlx::PgPool;
use tracing::warn;

use super::scheduler::Job;

pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let snapshot = PoolSnapshot::of(&self.pool);
        snapshot.record();
        if snapshot.is_saturated() {
            warn!(
                active = snapshot.active(),
                max = snapshot.max,
                "Database pool saturated"
            );
        }
        Ok(())
    }
}
