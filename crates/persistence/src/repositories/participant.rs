//! Participant repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ParticipantEntity;
use crate::error::{DbError, DbResult};
use crate::metrics::QueryTimer;

const PARTICIPANT_COLUMNS: &str =
    "id, group_id, device_id, nickname, joined_at, last_activity, is_active";

/// Repository for participant database operations.
#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    /// Creates a new ParticipantRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a participant. Fails with `Conflict` if the device already joined.
    pub async fn create(
        &self,
        group_id: Uuid,
        device_id: &str,
        nickname: &str,
    ) -> DbResult<ParticipantEntity> {
        let timer = QueryTimer::new("create_participant");
        let result = sqlx::query_as::<_, ParticipantEntity>(&format!(
            r#"
            INSERT INTO group_participants (group_id, device_id, nickname)
            VALUES ($1, $2, $3)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(group_id)
        .bind(device_id)
        .bind(nickname)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ParticipantEntity>> {
        let timer = QueryTimer::new("find_participant_by_id");
        let result = sqlx::query_as::<_, ParticipantEntity>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM group_participants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    pub async fn find_by_group_and_device(
        &self,
        group_id: Uuid,
        device_id: &str,
    ) -> DbResult<Option<ParticipantEntity>> {
        let timer = QueryTimer::new("find_participant_by_device");
        let result = sqlx::query_as::<_, ParticipantEntity>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM group_participants WHERE group_id = $1 AND device_id = $2"
        ))
        .bind(group_id)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Participants of a group in join order.
    pub async fn list_by_group(&self, group_id: Uuid) -> DbResult<Vec<ParticipantEntity>> {
        let timer = QueryTimer::new("list_participants_by_group");
        let result = sqlx::query_as::<_, ParticipantEntity>(&format!(
            r#"
            SELECT {PARTICIPANT_COLUMNS}
            FROM group_participants
            WHERE group_id = $1
            ORDER BY joined_at ASC
            "#
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Stamp `last_activity` and mark the participant active.
    pub async fn touch_activity(&self, id: Uuid) -> DbResult<()> {
        let timer = QueryTimer::new("touch_participant_activity");
        let result = sqlx::query(
            "UPDATE group_participants SET last_activity = NOW(), is_active = true WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();

        if result?.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    pub async fn count_by_group(&self, group_id: Uuid) -> DbResult<i64> {
        let timer = QueryTimer::new("count_participants_by_group");
        let result: Result<(i64,), sqlx::Error> =
            sqlx::query_as("SELECT COUNT(*) FROM group_participants WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(&self.pool)
                .await;
        timer.record();
        Ok(result?.0)
    }
}
