//! In-process event bus for group updates.
//!
//! The bus keeps a registry of live push connections per group and a short
//! replay log per group for polling clients. Publishing stamps the event,
//! appends it to the log and fans it out to every connection whose role may
//! see it. A connection whose channel is closed is dropped on the spot.
//!
//! The bus lives in one process. Running several API instances means each
//! one only sees its own publishes.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domain::models::realtime::EventsSince;
use domain::models::{EventEnvelope, RealtimeEvent, Role};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error};
use uuid::Uuid;

use crate::middleware::metrics::{record_event_published, record_realtime_connections};

/// Serialized frame handed to a push connection.
pub type Frame = Arc<str>;

struct Subscriber {
    role: Role,
    tx: mpsc::UnboundedSender<Frame>,
}

/// Receiving half of a push registration.
pub struct Subscription {
    pub conn_id: Uuid,
    pub rx: mpsc::UnboundedReceiver<Frame>,
}

#[derive(Debug, Clone, Copy)]
pub struct BusSettings {
    pub replay_capacity: usize,
    pub replay_retention: Duration,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            replay_capacity: 256,
            replay_retention: Duration::seconds(300),
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    connections: RwLock<HashMap<Uuid, HashMap<Uuid, Subscriber>>>,
    replay: RwLock<HashMap<Uuid, VecDeque<EventEnvelope>>>,
    settings: BusSettings,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new(settings: BusSettings) -> Self {
        Self {
            inner: Arc::new(BusInner {
                connections: RwLock::new(HashMap::new()),
                replay: RwLock::new(HashMap::new()),
                settings: BusSettings {
                    replay_capacity: settings.replay_capacity.max(1),
                    ..settings
                },
            }),
        }
    }

    /// Publishes `event` to the group and returns the stamped envelope.
    pub async fn publish(&self, group_id: Uuid, event: RealtimeEvent) -> EventEnvelope {
        let kind = event.kind();

        let envelope = {
            let mut replay = self.inner.replay.write().await;
            let log = replay.entry(group_id).or_default();

            // Strictly increasing per group, so a `since` cursor never skips
            // an event that shares a timestamp with the one before it.
            let now = Utc::now();
            let timestamp = match log.back() {
                Some(last) if last.timestamp >= now => {
                    last.timestamp + Duration::microseconds(1)
                }
                _ => now,
            };

            let envelope = EventEnvelope { event, timestamp };
            log.push_back(envelope.clone());
            while log.len() > self.inner.settings.replay_capacity {
                log.pop_front();
            }
            envelope
        };

        let frame: Frame = match serde_json::to_string(&envelope) {
            Ok(json) => json.into(),
            Err(e) => {
                error!(%group_id, event_type = kind, error = %e, "Failed to serialize event");
                return envelope;
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        {
            let connections = self.inner.connections.read().await;
            if let Some(subscribers) = connections.get(&group_id) {
                for (conn_id, sub) in subscribers {
                    if !envelope.event.visible_to(sub.role) {
                        continue;
                    }
                    if sub.tx.send(frame.clone()).is_ok() {
                        delivered += 1;
                    } else {
                        dead.push(*conn_id);
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut connections = self.inner.connections.write().await;
            if let Some(subscribers) = connections.get_mut(&group_id) {
                for conn_id in &dead {
                    subscribers.remove(conn_id);
                }
                if subscribers.is_empty() {
                    connections.remove(&group_id);
                }
            }
            record_realtime_connections(count(&connections));
        }

        debug!(%group_id, event_type = kind, delivered, dropped = dead.len(), "Event published");
        record_event_published(kind, delivered);
        envelope
    }

    /// Registers a push connection for the group.
    pub async fn register(&self, group_id: Uuid, role: Role) -> Subscription {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut connections = self.inner.connections.write().await;
        connections
            .entry(group_id)
            .or_default()
            .insert(conn_id, Subscriber { role, tx });
        record_realtime_connections(count(&connections));

        Subscription { conn_id, rx }
    }

    /// Removes the connection from every group it is registered in.
    pub async fn deregister(&self, conn_id: Uuid) {
        let mut connections = self.inner.connections.write().await;
        connections.retain(|_, subscribers| {
            subscribers.remove(&conn_id);
            !subscribers.is_empty()
        });
        record_realtime_connections(count(&connections));
    }

    /// Events newer than `since` that `role` may see, oldest first.
    pub async fn since(&self, group_id: Uuid, role: Role, since: DateTime<Utc>) -> EventsSince {
        let replay = self.inner.replay.read().await;
        let log = replay.get(&group_id);
        let updates = log
            .map(|log| {
                log.iter()
                    .filter(|e| e.timestamp > since && e.event.visible_to(role))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Bumped stamps can run ahead of the clock; the cursor must cover them.
        let newest = log.and_then(|log| log.back()).map(|e| e.timestamp);
        let now = Utc::now();
        EventsSince {
            updates,
            server_timestamp: newest.map_or(now, |newest| newest.max(now)),
        }
    }

    /// Drops all connections and the replay log of a deleted group.
    ///
    /// Connections see their channel close and shut down.
    pub async fn close_group(&self, group_id: Uuid) {
        let removed = {
            let mut connections = self.inner.connections.write().await;
            let removed = connections.remove(&group_id).map(|s| s.len()).unwrap_or(0);
            record_realtime_connections(count(&connections));
            removed
        };
        self.inner.replay.write().await.remove(&group_id);
        debug!(%group_id, connections = removed, "Group closed on event bus");
    }

    /// Evicts replay entries past the retention window. Returns how many.
    pub async fn prune_expired(&self) -> usize {
        let cutoff = Utc::now() - self.inner.settings.replay_retention;
        let mut pruned = 0;

        let mut replay = self.inner.replay.write().await;
        replay.retain(|_, log| {
            while log.front().is_some_and(|e| e.timestamp < cutoff) {
                log.pop_front();
                pruned += 1;
            }
            !log.is_empty()
        });
        pruned
    }

    pub async fn connection_count(&self) -> usize {
        count(&*self.inner.connections.read().await)
    }
}

fn count(connections: &HashMap<Uuid, HashMap<Uuid, Subscriber>>) -> usize {
    connections.values().map(HashMap::len).sum()
}
