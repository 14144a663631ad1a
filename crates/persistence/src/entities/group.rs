//! Group entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the groups table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupEntity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub join_token: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupEntity> for domain::models::Group {
    fn from(entity: GroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            owner_id: entity.owner_id,
            join_token: entity.join_token,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Group row joined with its participant count.
#[derive(Debug, Clone, FromRow)]
pub struct GroupWithCountEntity {
    #[sqlx(flatten)]
    pub group: GroupEntity,
    pub participant_count: i64,
}

impl From<GroupWithCountEntity> for domain::models::group::GroupSummary {
    fn from(entity: GroupWithCountEntity) -> Self {
        Self {
            group: entity.group.into(),
            participant_count: entity.participant_count,
        }
    }
}
