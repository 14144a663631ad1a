//! Group message board.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::message::{CreateMessageRequest, ListMessagesQuery};
use domain::models::{Message, MessageView, NewMessage, RealtimeEvent};
use persistence::repositories::MessageRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Credentials;
use crate::services::access::{authorize, touch_participant, AuthContext, Relation};

/// List messages oldest first.
///
/// GET /api/v1/groups/:group_id/messages?limit=&since=
pub async fn list_messages(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
    creds: Credentials,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let ctx = authorize(&state, &creds, group_id, Relation::Member).await?;
    touch_participant(&state, &ctx).await;

    let messages = MessageRepository::new(state.pool.clone())
        .list_by_group(group_id, query.since, query.effective_limit())
        .await?
        .into_iter()
        .map(MessageView::from)
        .collect();

    Ok(Json(messages))
}

/// Post a message. Messages from the owner are stored as system messages.
///
/// POST /api/v1/groups/:group_id/messages
pub async fn create_message(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    creds: Credentials,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    request.validate()?;
    let ctx = authorize(&state, &creds, group_id, Relation::Member).await?;

    let content = request.content.trim().to_string();
    let new_message = match &ctx {
        AuthContext::Participant { participant, .. } => {
            NewMessage::from_participant(group_id, participant.id, content)
        }
        AuthContext::Owner { .. } => NewMessage::system(group_id, content),
    }
    .goal_relevant(request.is_goal_relevant.unwrap_or(true));

    let message = store_and_publish(&state, &new_message).await?;
    touch_participant(&state, &ctx).await;

    info!(
        group_id = %group_id,
        message_id = %message.id,
        role = %ctx.role(),
        "Message posted"
    );

    Ok((StatusCode::CREATED, Json(message)))
}

/// Stores a message and announces it to the group.
pub(crate) async fn store_and_publish(
    state: &AppState,
    new_message: &NewMessage,
) -> Result<Message, ApiError> {
    let message = Message::from(
        MessageRepository::new(state.pool.clone())
            .create(new_message)
            .await?,
    );

    state
        .bus
        .publish(message.group_id, RealtimeEvent::message(&message))
        .await;

    Ok(message)
}
