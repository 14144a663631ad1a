//! User profile repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{UserEntity, UserRoleDb};
use crate::error::DbResult;
use crate::metrics::QueryTimer;

/// Repository for user profile database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserEntity>> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, full_name, role, avatar_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Create the profile, or update it if it already exists.
    pub async fn upsert_profile(
        &self,
        id: Uuid,
        email: Option<&str>,
        full_name: &str,
        role: UserRoleDb,
        avatar_url: Option<&str>,
    ) -> DbResult<UserEntity> {
        let timer = QueryTimer::new("upsert_user_profile");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, email, full_name, role, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                email = COALESCE(EXCLUDED.email, users.email),
                full_name = EXCLUDED.full_name,
                role = EXCLUDED.role,
                avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url),
                updated_at = NOW()
            RETURNING id, email, full_name, role, avatar_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(full_name)
        .bind(role)
        .bind(avatar_url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }
}
