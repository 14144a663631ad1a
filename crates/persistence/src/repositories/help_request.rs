//! Help request repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{HelpRequestEntity, HelpRequestStatusDb};
use crate::error::{DbError, DbResult};
use crate::metrics::QueryTimer;

const HELP_REQUEST_COLUMNS: &str =
    "id, participant_id, group_id, reason, status, resolved_by, resolved_at, created_at";

/// Repository for help request database operations.
#[derive(Clone)]
pub struct HelpRequestRepository {
    pool: PgPool,
}

impl HelpRequestRepository {
    /// Creates a new HelpRequestRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        participant_id: Uuid,
        group_id: Uuid,
        reason: &str,
    ) -> DbResult<HelpRequestEntity> {
        let timer = QueryTimer::new("create_help_request");
        let result = sqlx::query_as::<_, HelpRequestEntity>(&format!(
            r#"
            INSERT INTO help_requests (participant_id, group_id, reason)
            VALUES ($1, $2, $3)
            RETURNING {HELP_REQUEST_COLUMNS}
            "#
        ))
        .bind(participant_id)
        .bind(group_id)
        .bind(reason)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Find a help request only if it belongs to `group_id`.
    pub async fn find_in_group(&self, group_id: Uuid, id: Uuid) -> DbResult<HelpRequestEntity> {
        let timer = QueryTimer::new("find_help_request_in_group");
        let result = sqlx::query_as::<_, HelpRequestEntity>(&format!(
            "SELECT {HELP_REQUEST_COLUMNS} FROM help_requests WHERE id = $1 AND group_id = $2"
        ))
        .bind(id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.ok_or(DbError::NotFound)
    }

    /// Help requests of a group, newest first, optionally filtered by status.
    pub async fn list_by_group(
        &self,
        group_id: Uuid,
        status: Option<HelpRequestStatusDb>,
    ) -> DbResult<Vec<HelpRequestEntity>> {
        let timer = QueryTimer::new("list_help_requests_by_group");
        let result = sqlx::query_as::<_, HelpRequestEntity>(&format!(
            r#"
            SELECT {HELP_REQUEST_COLUMNS}
            FROM help_requests
            WHERE group_id = $1
              AND ($2::help_request_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(group_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Resolve one pending request.
    ///
    /// Fails with `NotFound` for an unknown id and `Conflict` when it is
    /// already resolved.
    pub async fn resolve(
        &self,
        group_id: Uuid,
        id: Uuid,
        resolved_by: Uuid,
    ) -> DbResult<HelpRequestEntity> {
        let timer = QueryTimer::new("resolve_help_request");
        let result = sqlx::query_as::<_, HelpRequestEntity>(&format!(
            r#"
            UPDATE help_requests SET
                status = 'resolved',
                resolved_by = $3,
                resolved_at = NOW()
            WHERE id = $1 AND group_id = $2 AND status = 'pending'
            RETURNING {HELP_REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(group_id)
        .bind(resolved_by)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match result? {
            Some(entity) => Ok(entity),
            None => {
                self.find_in_group(group_id, id).await?;
                Err(DbError::Conflict("help_request_already_resolved".to_string()))
            }
        }
    }

    /// Resolve every pending request of a participant in a group.
    pub async fn resolve_all_for_participant(
        &self,
        group_id: Uuid,
        participant_id: Uuid,
        resolved_by: Uuid,
    ) -> DbResult<Vec<HelpRequestEntity>> {
        let timer = QueryTimer::new("resolve_help_requests_for_participant");
        let result = sqlx::query_as::<_, HelpRequestEntity>(&format!(
            r#"
            UPDATE help_requests SET
                status = 'resolved',
                resolved_by = $3,
                resolved_at = NOW()
            WHERE group_id = $1 AND participant_id = $2 AND status = 'pending'
            RETURNING {HELP_REQUEST_COLUMNS}
            "#
        ))
        .bind(group_id)
        .bind(participant_id)
        .bind(resolved_by)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    pub async fn count_pending_by_group(&self, group_id: Uuid) -> DbResult<i64> {
        let timer = QueryTimer::new("count_pending_help_requests");
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            "SELECT COUNT(*) FROM help_requests WHERE group_id = $1 AND status = 'pending'",
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.0)
    }
}
