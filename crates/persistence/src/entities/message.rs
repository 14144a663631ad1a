//! Message entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the messages table.
#[derive(Debug, Clone, FromRow)]
pub struct MessageEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub participant_id: Option<Uuid>,
    pub content: String,
    pub is_system_message: bool,
    pub is_goal_relevant: bool,
    pub reply_to: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl From<MessageEntity> for domain::models::Message {
    fn from(entity: MessageEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            participant_id: entity.participant_id,
            content: entity.content,
            is_system_message: entity.is_system_message,
            is_goal_relevant: entity.is_goal_relevant,
            reply_to: entity.reply_to,
            timestamp: entity.timestamp,
        }
    }
}

/// Message joined with the author's nickname.
#[derive(Debug, Clone, FromRow)]
pub struct MessageWithAuthorEntity {
    #[sqlx(flatten)]
    pub message: MessageEntity,
    pub nickname: Option<String>,
}

impl From<MessageWithAuthorEntity> for domain::models::MessageView {
    fn from(entity: MessageWithAuthorEntity) -> Self {
        domain::models::MessageView::new(entity.message.into(), entity.nickname.as_deref())
    }
}

/// Per-participant message count.
#[derive(Debug, Clone, FromRow)]
pub struct MessageCountEntity {
    pub participant_id: Uuid,
    pub message_count: i64,
}
