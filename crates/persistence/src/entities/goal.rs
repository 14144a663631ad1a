//! Goal entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::goal::GoalType;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for goal_type that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "goal_type", rename_all = "lowercase")]
pub enum GoalTypeDb {
    Boolean,
    Percentage,
}

impl From<GoalTypeDb> for GoalType {
    fn from(db_type: GoalTypeDb) -> Self {
        match db_type {
            GoalTypeDb::Boolean => GoalType::Boolean,
            GoalTypeDb::Percentage => GoalType::Percentage,
        }
    }
}

impl From<GoalType> for GoalTypeDb {
    fn from(goal_type: GoalType) -> Self {
        match goal_type {
            GoalType::Boolean => GoalTypeDb::Boolean,
            GoalType::Percentage => GoalTypeDb::Percentage,
        }
    }
}

/// Database row mapping for the goals table.
#[derive(Debug, Clone, FromRow)]
pub struct GoalEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub goal_type: GoalTypeDb,
    pub target_value: i32,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl From<GoalEntity> for domain::models::Goal {
    fn from(entity: GoalEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            title: entity.title,
            description: entity.description,
            goal_type: entity.goal_type.into(),
            target_value: entity.target_value,
            order_index: entity.order_index,
            created_at: entity.created_at,
        }
    }
}
