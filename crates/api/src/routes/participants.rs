//! Joining a group with its join token.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::participant::{JoinGroupRequest, JoinGroupResponse};
use domain::models::{GoalProgress, Group, Participant};
use domain::services::goals_with_progress;
use persistence::repositories::{GoalProgressRepository, GroupRepository, ParticipantRepository};
use persistence::DbError;
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_participant_joined;
use crate::routes::groups::{load_goals, load_participant_progress};

/// Join a group as a participant.
///
/// POST /api/v1/participants/join
///
/// Joining again from the same device returns the existing participant
/// with 200 instead of 201. Progress rows are created for every goal; a
/// failure there is logged and does not fail the join.
pub async fn join_group(
    State(state): State<AppState>,
    Json(request): Json<JoinGroupRequest>,
) -> Result<(StatusCode, Json<JoinGroupResponse>), ApiError> {
    request.validate()?;

    let token = request.join_token.trim();
    let device_id = request.device_id.trim();
    let nickname = request.nickname.trim();

    let group = match GroupRepository::new(state.pool.clone())
        .find_by_join_token(token)
        .await
    {
        Ok(group) => Group::from(group),
        Err(DbError::NotFound) => {
            return Err(ApiError::NotFound(
                "Skupina s tímto kódem neexistuje nebo není aktivní".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let participants = ParticipantRepository::new(state.pool.clone());
    let (participant, is_existing) = match participants
        .find_by_group_and_device(group.id, device_id)
        .await?
    {
        Some(existing) => (Participant::from(existing), true),
        None => match participants.create(group.id, device_id, nickname).await {
            Ok(created) => (Participant::from(created), false),
            // Lost a race with a concurrent join from the same device.
            Err(DbError::Conflict(_)) => {
                let existing = participants
                    .find_by_group_and_device(group.id, device_id)
                    .await?
                    .ok_or_else(|| ApiError::Conflict("Připojení se nezdařilo".into()))?;
                (Participant::from(existing), true)
            }
            Err(e) => return Err(e.into()),
        },
    };

    if let Err(e) = GoalProgressRepository::new(state.pool.clone())
        .init_for_participant(participant.id, group.id)
        .await
    {
        warn!(
            participant_id = %participant.id,
            group_id = %group.id,
            error = %e,
            "Failed to initialize goal progress"
        );
    }

    let goals = load_goals(&state, group.id).await?;
    let progress: Vec<GoalProgress> = load_participant_progress(&state, participant.id).await?;

    record_participant_joined(is_existing);
    info!(
        group_id = %group.id,
        participant_id = %participant.id,
        is_existing,
        "Participant joined"
    );

    let (status, message) = if is_existing {
        (StatusCode::OK, "Vítejte zpět ve skupině")
    } else {
        (StatusCode::CREATED, "Úspěšně jste se připojili ke skupině")
    };

    Ok((
        status,
        Json(JoinGroupResponse {
            goals: goals_with_progress(&goals, &progress),
            group: group.public_info(),
            participant,
            progress,
            is_existing,
            message: message.into(),
        }),
    ))
}
