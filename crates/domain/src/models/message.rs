//! Group chat messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Author label for messages without a participant.
pub const SYSTEM_AUTHOR: &str = "System";

/// Maximum number of messages returned by one listing.
pub const MAX_MESSAGE_PAGE: i64 = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub group_id: Uuid,
    pub participant_id: Option<Uuid>,
    pub content: String,
    pub is_system_message: bool,
    pub is_goal_relevant: bool,
    /// The message this one answers, set on chat replies.
    pub reply_to: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

/// A message about to be stored.
///
/// A message without a participant is always a system message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub group_id: Uuid,
    pub participant_id: Option<Uuid>,
    pub content: String,
    pub is_goal_relevant: bool,
    pub reply_to: Option<Uuid>,
}

impl NewMessage {
    pub fn from_participant(group_id: Uuid, participant_id: Uuid, content: String) -> Self {
        Self {
            group_id,
            participant_id: Some(participant_id),
            content,
            is_goal_relevant: true,
            reply_to: None,
        }
    }

    pub fn system(group_id: Uuid, content: String) -> Self {
        Self {
            group_id,
            participant_id: None,
            content,
            is_goal_relevant: true,
            reply_to: None,
        }
    }

    pub fn goal_relevant(mut self, relevant: bool) -> Self {
        self.is_goal_relevant = relevant;
        self
    }

    pub fn in_reply_to(mut self, message_id: Uuid) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn is_system_message(&self) -> bool {
        self.participant_id.is_none()
    }
}

/// Request payload for posting a message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    #[validate(
        length(min = 1, max = 4000, message = "Zpráva musí mít 1 až 4000 znaků"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub content: String,

    pub is_goal_relevant: Option<bool>,
}

/// Query parameters for listing messages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesQuery {
    pub limit: Option<i64>,
    pub since: Option<DateTime<Utc>>,
}

impl ListMessagesQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, MAX_MESSAGE_PAGE)
    }
}

/// A message with its author's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub author: String,
}

impl MessageView {
    pub fn new(message: Message, nickname: Option<&str>) -> Self {
        let author = match (message.participant_id, nickname) {
            (Some(_), Some(name)) => name.to_string(),
            _ => SYSTEM_AUTHOR.to_string(),
        };
        Self { message, author }
    }
}
