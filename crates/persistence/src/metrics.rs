//! Query and connection pool metrics.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Point-in-time view of the connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub total: u32,
    pub idle: u32,
    pub max: u32,
}

impl PoolSnapshot {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            total: pool.size(),
            idle: pool.num_idle() as u32,
            max: pool.options().get_max_connections(),
        }
    }

    pub fn active(&self) -> u32 {
        self.total.saturating_sub(self.idle)
    }

    /// Every allowed connection is checked out.
    pub fn is_saturated(&self) -> bool {
        self.max > 0 && self.active() >= self.max
    }

    pub fn record(&self) {
        gauge!("db_pool_connections", "state" => "active").set(self.active() as f64);
        gauge!("db_pool_connections", "state" => "idle").set(self.idle as f64);
        gauge!("db_pool_connections_max").set(self.max as f64);
    }
}

/// Times one repository call and records it under
/// `db_query_duration_seconds{query}`.
///
/// ```ignore
/// let timer = QueryTimer::new("find_group_by_join_token");
/// let row = sqlx::query_as::<_, GroupEntity>(SQL).fetch_optional(&self.pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query: &'static str,
    started: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            started: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!("db_query_duration_seconds", "query" => self.query)
            .record(self.started.elapsed().as_secs_f64());
    }
}
