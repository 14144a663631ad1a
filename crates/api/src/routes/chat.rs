//! Chat with the group assistant, in standard or assisted mode.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{Message, NewMessage};
use domain::services::chat::is_goal_relevant;
use domain::services::{goals_with_progress, ChatContext, ChatMode, ChatReply, ChatTurn};
use persistence::repositories::MessageRepository;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Credentials;
use crate::middleware::metrics::record_chat_reply;
use crate::routes::groups::{load_goals, load_participant_progress};
use crate::routes::messages::store_and_publish;
use crate::services::access::{authorize, touch_participant, AuthContext, Relation};

/// Earlier messages handed to the responder.
const HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[validate(
        length(min = 1, max = 4000, message = "Zpráva musí mít 1 až 4000 znaků"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub content: String,

    #[serde(default)]
    pub mode: ChatMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub user_message: Message,
    pub reply: ChatExchangeReply,
}

/// The responder's answer together with the message it was stored as.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExchangeReply {
    pub message: Message,
    #[serde(flatten)]
    pub reply: ChatReply,
}

/// POST /api/v1/groups/:group_id/chat
pub async fn send_chat_message(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    creds: Credentials,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    request.validate()?;
    let ctx = authorize(&state, &creds, group_id, Relation::Member).await?;
    let content = request.content.trim().to_string();

    let context = build_context(&state, &ctx).await?;

    let relevant = match request.mode {
        ChatMode::Standard => is_goal_relevant(&content),
        ChatMode::Assisted => true,
    };
    let user_message = match &ctx {
        AuthContext::Participant { participant, .. } => {
            NewMessage::from_participant(group_id, participant.id, content.clone())
        }
        AuthContext::Owner { .. } => NewMessage::system(group_id, content.clone()),
    }
    .goal_relevant(relevant);
    let user_message = store_and_publish(&state, &user_message).await?;

    let reply = state.chat.respond(request.mode, &content, &context).await;
    record_chat_reply(reply.mode, reply.degraded);

    let reply_message = store_and_publish(
        &state,
        &NewMessage::system(group_id, reply.content.clone())
            .goal_relevant(reply.is_goal_relevant)
            .in_reply_to(user_message.id),
    )
    .await?;
    touch_participant(&state, &ctx).await;

    info!(
        group_id = %group_id,
        mode = %reply.mode,
        degraded = reply.degraded,
        goal_relevant = reply.is_goal_relevant,
        "Chat reply sent"
    );

    Ok(Json(ChatResponse {
        user_message,
        reply: ChatExchangeReply {
            message: reply_message,
            reply,
        },
    }))
}

async fn build_context(state: &AppState, ctx: &AuthContext) -> Result<ChatContext, ApiError> {
    let group = ctx.group();
    let goals = load_goals(state, group.id).await?;
    let messages = MessageRepository::new(state.pool.clone());

    let (rows, history) = match ctx {
        AuthContext::Participant { participant, .. } => {
            let rows = load_participant_progress(state, participant.id).await?;
            let history = messages
                .list_recent_for_participant(group.id, participant.id, HISTORY_LIMIT)
                .await?
                .into_iter()
                .map(|m| ChatTurn {
                    from_student: m.participant_id.is_some(),
                    content: m.content,
                })
                .collect();
            (rows, history)
        }
        AuthContext::Owner { .. } => {
            let history = messages
                .list_by_group(group.id, None, HISTORY_LIMIT)
                .await?
                .into_iter()
                .map(|m| ChatTurn {
                    from_student: m.message.participant_id.is_some(),
                    content: m.message.content,
                })
                .collect();
            (Vec::new(), history)
        }
    };

    Ok(ChatContext {
        group_name: Some(group.name.clone()),
        group_description: Some(group.description.clone()),
        goals: goals_with_progress(&goals, &rows),
        history,
    })
}
