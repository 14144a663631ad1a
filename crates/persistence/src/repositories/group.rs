//! Group repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GroupEntity, GroupWithCountEntity};
use crate::error::{DbError, DbResult};
use crate::metrics::QueryTimer;

const GROUP_COLUMNS: &str =
    "id, name, description, owner_id, join_token, is_active, created_at, updated_at";

/// Repository for group-related database operations.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new group. Fails with `Conflict` if the join token is taken.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        owner_id: Uuid,
        join_token: &str,
    ) -> DbResult<GroupEntity> {
        let timer = QueryTimer::new("create_group");
        let result = sqlx::query_as::<_, GroupEntity>(&format!(
            r#"
            INSERT INTO groups (name, description, owner_id, join_token)
            VALUES ($1, $2, $3, $4)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(description)
        .bind(owner_id)
        .bind(join_token)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Find a group by ID, active or not.
    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<GroupEntity>> {
        let timer = QueryTimer::new("find_group_by_id");
        let result = sqlx::query_as::<_, GroupEntity>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Find an active group by join token.
    ///
    /// Unknown tokens and inactive groups both yield `NotFound`.
    pub async fn find_by_join_token(&self, token: &str) -> DbResult<GroupEntity> {
        let timer = QueryTimer::new("find_group_by_join_token");
        let result = sqlx::query_as::<_, GroupEntity>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE join_token = $1 AND is_active = true"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.ok_or(DbError::NotFound)
    }

    /// List groups owned by a user, newest first, with participant counts.
    pub async fn list_by_owner(&self, owner_id: Uuid) -> DbResult<Vec<GroupWithCountEntity>> {
        let timer = QueryTimer::new("list_groups_by_owner");
        let result = sqlx::query_as::<_, GroupWithCountEntity>(
            r#"
            SELECT g.id, g.name, g.description, g.owner_id, g.join_token, g.is_active,
                   g.created_at, g.updated_at,
                   (SELECT COUNT(*) FROM group_participants gp WHERE gp.group_id = g.id) AS participant_count
            FROM groups g
            WHERE g.owner_id = $1
            ORDER BY g.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Update name, description or active flag. `None` keeps the stored value.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        is_active: Option<bool>,
    ) -> DbResult<GroupEntity> {
        let timer = QueryTimer::new("update_group");
        let result = sqlx::query_as::<_, GroupEntity>(&format!(
            r#"
            UPDATE groups SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.ok_or(DbError::NotFound)
    }

    /// Delete a group and, by cascade, everything under it.
    ///
    /// Fails with `Forbidden` unless `requester_id` owns the group.
    pub async fn delete(&self, id: Uuid, requester_id: Uuid) -> DbResult<()> {
        let timer = QueryTimer::new("delete_group");

        let owner: Option<(Uuid,)> = sqlx::query_as("SELECT owner_id FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match owner {
            None => return Err(DbError::NotFound),
            Some((owner_id,)) if owner_id != requester_id => return Err(DbError::Forbidden),
            Some(_) => {}
        }

        let result = sqlx::query("DELETE FROM groups WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(requester_id)
            .execute(&self.pool)
            .await;
        timer.record();

        if result?.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
