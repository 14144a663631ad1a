//! Message repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::NewMessage;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{MessageCountEntity, MessageEntity, MessageWithAuthorEntity};
use crate::error::DbResult;
use crate::metrics::QueryTimer;

/// Repository for message database operations.
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Creates a new MessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, message: &NewMessage) -> DbResult<MessageEntity> {
        let timer = QueryTimer::new("create_message");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            INSERT INTO messages (group_id, participant_id, content, is_system_message, is_goal_relevant, reply_to)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, group_id, participant_id, content, is_system_message, is_goal_relevant, reply_to, timestamp
            "#,
        )
        .bind(message.group_id)
        .bind(message.participant_id)
        .bind(&message.content)
        .bind(message.is_system_message())
        .bind(message.is_goal_relevant)
        .bind(message.reply_to)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// The newest `limit` messages of a group (after `since`, if given),
    /// returned oldest first with author nicknames.
    pub async fn list_by_group(
        &self,
        group_id: Uuid,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> DbResult<Vec<MessageWithAuthorEntity>> {
        let timer = QueryTimer::new("list_messages_by_group");
        let result = sqlx::query_as::<_, MessageWithAuthorEntity>(
            r#"
            SELECT * FROM (
                SELECT m.id, m.group_id, m.participant_id, m.content, m.is_system_message,
                       m.is_goal_relevant, m.reply_to, m.timestamp, p.nickname
                FROM messages m
                LEFT JOIN group_participants p ON p.id = m.participant_id
                WHERE m.group_id = $1
                  AND ($2::timestamptz IS NULL OR m.timestamp > $2)
                ORDER BY m.timestamp DESC
                LIMIT $3
            ) recent
            ORDER BY recent.timestamp ASC
            "#,
        )
        .bind(group_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Recent conversation of one participant, oldest first: their own
    /// messages, replies to them, and system messages that answer no one
    /// (owner announcements). Replies to other participants are excluded.
    pub async fn list_recent_for_participant(
        &self,
        group_id: Uuid,
        participant_id: Uuid,
        limit: i64,
    ) -> DbResult<Vec<MessageEntity>> {
        let timer = QueryTimer::new("list_recent_messages_for_participant");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT * FROM (
                SELECT m.id, m.group_id, m.participant_id, m.content, m.is_system_message,
                       m.is_goal_relevant, m.reply_to, m.timestamp
                FROM messages m
                LEFT JOIN messages q ON q.id = m.reply_to
                WHERE m.group_id = $1
                  AND (
                      m.participant_id = $2
                      OR (m.participant_id IS NULL AND (m.reply_to IS NULL OR q.participant_id = $2))
                  )
                ORDER BY m.timestamp DESC
                LIMIT $3
            ) recent
            ORDER BY recent.timestamp ASC
            "#,
        )
        .bind(group_id)
        .bind(participant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    /// Message counts per participant in a group.
    pub async fn count_by_participant_in_group(&self, group_id: Uuid) -> DbResult<Vec<MessageCountEntity>> {
        let timer = QueryTimer::new("count_messages_by_participant");
        let result = sqlx::query_as::<_, MessageCountEntity>(
            r#"
            SELECT participant_id, COUNT(*) AS message_count
            FROM messages
            WHERE group_id = $1 AND participant_id IS NOT NULL
            GROUP BY participant_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }
}
