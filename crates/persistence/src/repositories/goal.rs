//! Goal repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GoalEntity, GoalTypeDb};
use crate::error::{DbError, DbResult};
use crate::metrics::QueryTimer;

const GOAL_COLUMNS: &str =
    "id, group_id, title, description, goal_type, target_value, order_index, created_at";

/// Fields for a new goal.
#[derive(Debug, Clone)]
pub struct NewGoal<'a> {
    pub group_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub goal_type: GoalTypeDb,
    pub target_value: i32,
    pub order_index: i32,
}

/// Partial goal update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct GoalChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub goal_type: Option<GoalTypeDb>,
    pub target_value: Option<i32>,
    pub order_index: Option<i32>,
}

/// Repository for goal database operations.
#[derive(Clone)]
pub struct GoalRepository {
    pool: PgPool,
}

impl GoalRepository {
    /// Creates a new GoalRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, goal: NewGoal<'_>) -> DbResult<GoalEntity> {
        let timer = QueryTimer::new("create_goal");
        let result = sqlx::query_as::<_, GoalEntity>(&format!(
            r#"
            INSERT INTO goals (group_id, title, description, goal_type, target_value, order_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {GOAL_COLUMNS}
            "#
        ))
        .bind(goal.group_id)
        .bind(goal.title)
        .bind(goal.description)
        .bind(goal.goal_type)
        .bind(goal.target_value)
        .bind(goal.order_index)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<GoalEntity>> {
        let timer = QueryTimer::new("find_goal_by_id");
        let result = sqlx::query_as::<_, GoalEntity>(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Find a goal only if it belongs to `group_id`.
    pub async fn find_in_group(&self, group_id: Uuid, goal_id: Uuid) -> DbResult<GoalEntity> {
        let timer = QueryTimer::new("find_goal_in_group");
        let result = sqlx::query_as::<_, GoalEntity>(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE id = $1 AND group_id = $2"
        ))
        .bind(goal_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.ok_or(DbError::NotFound)
    }

    /// Goals of a group ordered by `order_index`, then creation time.
    pub async fn list_by_group(&self, group_id: Uuid) -> DbResult<Vec<GoalEntity>> {
        let timer = QueryTimer::new("list_goals_by_group");
        let result = sqlx::query_as::<_, GoalEntity>(&format!(
            r#"
            SELECT {GOAL_COLUMNS}
            FROM goals
            WHERE group_id = $1
            ORDER BY order_index ASC, created_at ASC
            "#
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    pub async fn update(
        &self,
        group_id: Uuid,
        goal_id: Uuid,
        changes: GoalChanges<'_>,
    ) -> DbResult<GoalEntity> {
        let timer = QueryTimer::new("update_goal");
        let result = sqlx::query_as::<_, GoalEntity>(&format!(
            r#"
            UPDATE goals SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                goal_type = COALESCE($5, goal_type),
                target_value = CASE
                    WHEN COALESCE($5, goal_type) = 'boolean' THEN 1
                    ELSE COALESCE($6, target_value)
                END,
                order_index = COALESCE($7, order_index)
            WHERE id = $1 AND group_id = $2
            RETURNING {GOAL_COLUMNS}
            "#
        ))
        .bind(goal_id)
        .bind(group_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.goal_type)
        .bind(changes.target_value)
        .bind(changes.order_index)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.ok_or(DbError::NotFound)
    }

    pub async fn delete(&self, group_id: Uuid, goal_id: Uuid) -> DbResult<()> {
        let timer = QueryTimer::new("delete_goal");
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND group_id = $2")
            .bind(goal_id)
            .bind(group_id)
            .execute(&self.pool)
            .await;
        timer.record();

        if result?.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
