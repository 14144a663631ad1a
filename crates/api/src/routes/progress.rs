//! Goal progress updates.
//!
//! Values are last-write-wins and may go down. Completion is re-derived from
//! the goal on every write and pushed to the group as `goal_progress_updated`.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::progress::{derive_for_goal, ProgressResponse, UpdateProgressRequest};
use domain::models::{Goal, GoalProgress, RealtimeEvent};
use persistence::repositories::{GoalProgressRepository, GoalRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Credentials;
use crate::services::access::{authorize, touch_participant, AuthContext, Relation};

fn progress_not_found() -> ApiError {
    ApiError::NotFound("Záznam o pokroku nebyl nalezen".into())
}

/// Update a progress row by id.
///
/// PUT /api/v1/progress/:progress_id
///
/// Allowed for the participant owning the row and for the group owner.
pub async fn update_progress(
    State(state): State<AppState>,
    Path(progress_id): Path<Uuid>,
    creds: Credentials,
    Json(request): Json<UpdateProgressRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    request.validate()?;

    let repo = GoalProgressRepository::new(state.pool.clone());
    let row = repo
        .find_by_id(progress_id)
        .await?
        .map(GoalProgress::from)
        .ok_or_else(progress_not_found)?;

    let goal = GoalRepository::new(state.pool.clone())
        .find_by_id(row.goal_id)
        .await?
        .map(Goal::from)
        .ok_or_else(progress_not_found)?;

    let ctx = authorize(&state, &creds, goal.group_id, Relation::Member).await?;
    if let AuthContext::Participant { participant, .. } = &ctx {
        if participant.id != row.participant_id {
            return Err(ApiError::Forbidden(
                "Tento záznam patří jinému účastníkovi".into(),
            ));
        }
        touch_participant(&state, &ctx).await;
    }

    let updated = GoalProgress::from(
        repo.update_by_id(progress_id, &goal, request.current_value)
            .await?,
    );

    Ok(Json(publish_progress(&state, &goal, updated).await))
}

/// Record the caller's progress on one goal, creating the row if needed.
///
/// PUT /api/v1/groups/:group_id/goals/:goal_id/progress
pub async fn upsert_goal_progress(
    State(state): State<AppState>,
    Path((group_id, goal_id)): Path<(Uuid, Uuid)>,
    creds: Credentials,
    Json(request): Json<UpdateProgressRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    request.validate()?;

    let ctx = authorize(&state, &creds, group_id, Relation::Participant).await?;
    let participant_id = ctx
        .participant()
        .map(|p| p.id)
        .ok_or_else(|| ApiError::Forbidden("Pokrok zapisují pouze účastníci".into()))?;

    let goal = Goal::from(
        GoalRepository::new(state.pool.clone())
            .find_in_group(group_id, goal_id)
            .await?,
    );

    let row = GoalProgress::from(
        GoalProgressRepository::new(state.pool.clone())
            .upsert(participant_id, &goal, request.current_value)
            .await?,
    );
    touch_participant(&state, &ctx).await;

    Ok(Json(publish_progress(&state, &goal, row).await))
}

async fn publish_progress(state: &AppState, goal: &Goal, row: GoalProgress) -> ProgressResponse {
    let completion = derive_for_goal(goal, row.current_value);

    state
        .bus
        .publish(
            goal.group_id,
            RealtimeEvent::progress(row.participant_id, goal.id, row.current_value, completion),
        )
        .await;

    info!(
        group_id = %goal.group_id,
        goal_id = %goal.id,
        participant_id = %row.participant_id,
        current_value = row.current_value,
        is_completed = completion.is_completed,
        "Progress updated"
    );

    ProgressResponse {
        progress: row,
        percent: completion.percent,
    }
}
