//! Evicts expired entries from the realtime replay log.

use std::time::Duration;

use tracing::debug;

use super::scheduler::Job;
use crate::middleware::metrics::record_realtime_connections;
use crate::realtime::EventBus;

pub struct RealtimePruneJob {
    bus: EventBus,
    every: Duration,
}

impl RealtimePruneJob {
    pub fn new(bus: EventBus, every: Duration) -> Self {
        Self {
            bus,
            every: every.max(Duration::from_secs(1)),
        }
    }
}

#[async_trait::async_trait]
impl Job for RealtimePruneJob {
    fn name(&self) -> &'static str {
        "realtime_prune"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let pruned = self.bus.prune_expired().await;
        record_realtime_connections(self.bus.connection_count().await);
        if pruned > 0 {
            debug!(pruned, "Pruned expired realtime events");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::BusSettings;
    use domain::models::{Completion, RealtimeEvent, Role};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_prunes_bus() {
        let bus = EventBus::new(BusSettings {
            replay_capacity: 8,
            replay_retention: chrono::Duration::zero(),
        });
        let group_id = Uuid::new_v4();
        bus.publish(
            group_id,
            RealtimeEvent::progress(
                Uuid::new_v4(),
                Uuid::new_v4(),
                1,
                Completion {
                    is_completed: true,
                    percent: 100,
                },
            ),
        )
        .await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let job = RealtimePruneJob::new(bus.clone(), Duration::from_millis(1));
        assert_eq!(job.interval(), Duration::from_secs(1));
        job.execute().await.unwrap();

        let page = bus
            .since(group_id, Role::Owner, chrono::Utc::now() - chrono::Duration::hours(1))
            .await;
        assert!(page.updates.is_empty());
    }
}
