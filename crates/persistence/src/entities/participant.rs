//! Participant entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the group_participants table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub device_id: String,
    pub nickname: String,
    pub joined_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
}

impl From<ParticipantEntity> for domain::models::Participant {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            device_id: entity.device_id,
            nickname: entity.nickname,
            joined_at: entity.joined_at,
            last_activity: entity.last_activity,
            is_active: entity.is_active,
        }
    }
}
