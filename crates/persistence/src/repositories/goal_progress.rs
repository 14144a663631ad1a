//! Goal progress repository for database operations.
//!
//! Completion is derived from the goal definition before every write, so a
//! stored `is_completed` always matches its `current_value`.

use domain::models::progress::derive_for_goal;
use domain::models::{Goal, GoalType};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::GoalProgressEntity;
use crate::error::{DbError, DbResult};
use crate::metrics::QueryTimer;

const PROGRESS_COLUMNS: &str = "id, participant_id, goal_id, current_value, is_completed, updated_at";

/// Repository for goal progress database operations.
#[derive(Clone)]
pub struct GoalProgressRepository {
    pool: PgPool,
}

impl GoalProgressRepository {
    /// Creates a new GoalProgressRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record `new_value` for a participant on a goal, creating the row if needed.
    ///
    /// Always overwrites the stored value, including with a lower one.
    pub async fn upsert(
        &self,
        participant_id: Uuid,
        goal: &Goal,
        new_value: i32,
    ) -> DbResult<GoalProgressEntity> {
        let completion = derive_for_goal(goal, new_value);
        let timer = QueryTimer::new("upsert_goal_progress");
        let result = sqlx::query_as::<_, GoalProgressEntity>(&format!(
            r#"
            INSERT INTO goal_progress (participant_id, goal_id, current_value, is_completed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (participant_id, goal_id) DO UPDATE SET
                current_value = EXCLUDED.current_value,
                is_completed = EXCLUDED.is_completed,
                updated_at = NOW()
            RETURNING {PROGRESS_COLUMNS}
            "#
        ))
        .bind(participant_id)
        .bind(goal.id)
        .bind(new_value.max(0))
        .bind(completion.is_completed)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<GoalProgressEntity>> {
        let timer = QueryTimer::new("find_goal_progress_by_id");
        let result = sqlx::query_as::<_, GoalProgressEntity>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM goal_progress WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Overwrite an existing row by id, re-deriving completion from `goal`.
    pub async fn update_by_id(
        &self,
        id: Uuid,
        goal: &Goal,
        new_value: i32,
    ) -> DbResult<GoalProgressEntity> {
        let completion = derive_for_goal(goal, new_value);
        let timer = QueryTimer::new("update_goal_progress_by_id");
        let result = sqlx::query_as::<_, GoalProgressEntity>(&format!(
            r#"
            UPDATE goal_progress SET
                current_value = $2,
                is_completed = $3,
                updated_at = NOW()
            WHERE id = $1 AND goal_id = $4
            RETURNING {PROGRESS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_value.max(0))
        .bind(completion.is_completed)
        .bind(goal.id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.ok_or(DbError::NotFound)
    }

    /// Re-derive `is_completed` on every row of `goal` after its definition
    /// changed. Values are untouched. Returns the number of rows flipped.
    pub async fn rederive_for_goal(&self, goal: &Goal) -> DbResult<u64> {
        let threshold = match goal.goal_type {
            GoalType::Boolean => 1,
            GoalType::Percentage => goal.target_value.max(1),
        };
        let timer = QueryTimer::new("rederive_goal_progress");
        let result = sqlx::query(
            r#"
            UPDATE goal_progress SET
                is_completed = current_value >= $2
            WHERE goal_id = $1 AND is_completed IS DISTINCT FROM (current_value >= $2)
            "#,
        )
        .bind(goal.id)
        .bind(threshold)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn list_by_participant(
        &self,
        participant_id: Uuid,
    ) -> DbResult<Vec<GoalProgressEntity>> {
        let timer = QueryTimer::new("list_goal_progress_by_participant");
        let result = sqlx::query_as::<_, GoalProgressEntity>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM goal_progress WHERE participant_id = $1"
        ))
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Every progress row of every participant in a group.
    pub async fn list_by_group(&self, group_id: Uuid) -> DbResult<Vec<GoalProgressEntity>> {
        let timer = QueryTimer::new("list_goal_progress_by_group");
        let result = sqlx::query_as::<_, GoalProgressEntity>(
            r#"
            SELECT gp.id, gp.participant_id, gp.goal_id, gp.current_value, gp.is_completed, gp.updated_at
            FROM goal_progress gp
            JOIN group_participants p ON p.id = gp.participant_id
            WHERE p.group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Create zero rows for every goal currently in the group.
    ///
    /// Existing rows are left alone. Returns the number of rows inserted.
    pub async fn init_for_participant(&self, participant_id: Uuid, group_id: Uuid) -> DbResult<u64> {
        let timer = QueryTimer::new("init_goal_progress");
        let result = sqlx::query(
            r#"
            INSERT INTO goal_progress (participant_id, goal_id, current_value, is_completed)
            SELECT $1, g.id, 0, false
            FROM goals g
            WHERE g.group_id = $2
            ON CONFLICT (participant_id, goal_id) DO NOTHING
            "#,
        )
        .bind(participant_id)
        .bind(group_id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
