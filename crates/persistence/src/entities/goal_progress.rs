//! Goal progress entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the goal_progress table.
#[derive(Debug, Clone, FromRow)]
pub struct GoalProgressEntity {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub goal_id: Uuid,
    pub current_value: i32,
    pub is_completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<GoalProgressEntity> for domain::models::GoalProgress {
    fn from(entity: GoalProgressEntity) -> Self {
        Self {
            id: entity.id,
            participant_id: entity.participant_id,
            goal_id: entity.goal_id,
            current_value: entity.current_value,
            is_completed: entity.is_completed,
            updated_at: entity.updated_at,
        }
    }
}
