//! Goal routes. Owners manage goals; participants read them with their own progress.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::goal::{CreateGoalRequest, UpdateGoalRequest};
use domain::models::{Goal, GoalList};
use domain::services::goals_with_progress;
use persistence::entities::GoalTypeDb;
use persistence::repositories::{GoalChanges, GoalProgressRepository, GoalRepository, NewGoal};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Credentials;
use crate::routes::groups::{load_goals, load_participant_progress};
use crate::services::access::{authorize, touch_participant, AuthContext, Relation};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGoalResponse {
    pub success: bool,
}

/// POST /api/v1/groups/:group_id/goals
pub async fn create_goal(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    creds: Credentials,
    Json(request): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    request.validate()?;
    authorize(&state, &creds, group_id, Relation::Owner).await?;

    let repo = GoalRepository::new(state.pool.clone());
    let order_index = match request.order_index {
        Some(index) => index,
        None => repo.list_by_group(group_id).await?.len() as i32,
    };

    let goal = repo
        .create(NewGoal {
            group_id,
            title: request.title.trim(),
            description: request.description.as_deref(),
            goal_type: GoalTypeDb::from(request.resolved_goal_type()),
            target_value: request.resolved_target(),
            order_index,
        })
        .await?;

    info!(group_id = %group_id, goal_id = %goal.id, "Goal created");

    Ok((StatusCode::CREATED, Json(Goal::from(goal))))
}

/// List a group's goals in display order.
///
/// GET /api/v1/groups/:group_id/goals
///
/// Participants get each goal paired with their own progress.
pub async fn list_goals(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    creds: Credentials,
) -> Result<Json<GoalList>, ApiError> {
    let ctx = authorize(&state, &creds, group_id, Relation::Member).await?;
    let goals = load_goals(&state, group_id).await?;

    let list = match &ctx {
        AuthContext::Owner { .. } => GoalList::Owner(goals),
        AuthContext::Participant { participant, .. } => {
            touch_participant(&state, &ctx).await;
            let rows = load_participant_progress(&state, participant.id).await?;
            GoalList::Participant(goals_with_progress(&goals, &rows))
        }
    };

    Ok(Json(list))
}

/// PUT /api/v1/groups/:group_id/goals/:goal_id
pub async fn update_goal(
    State(state): State<AppState>,
    Path((group_id, goal_id)): Path<(Uuid, Uuid)>,
    creds: Credentials,
    Json(request): Json<UpdateGoalRequest>,
) -> Result<Json<Goal>, ApiError> {
    request.validate()?;
    authorize(&state, &creds, group_id, Relation::Owner).await?;

    let goal = GoalRepository::new(state.pool.clone())
        .update(
            group_id,
            goal_id,
            GoalChanges {
                title: request.title.as_deref().map(str::trim),
                description: request.description.as_deref(),
                goal_type: request.goal_type.map(GoalTypeDb::from),
                target_value: request.target_value,
                order_index: request.order_index,
            },
        )
        .await?;
    let goal = Goal::from(goal);

    // Target or type may have moved, so stored completion flags follow.
    let rederived = GoalProgressRepository::new(state.pool.clone())
        .rederive_for_goal(&goal)
        .await?;

    info!(group_id = %group_id, goal_id = %goal_id, rederived, "Goal updated");

    Ok(Json(goal))
}

/// DELETE /api/v1/groups/:group_id/goals/:goal_id
pub async fn delete_goal(
    State(state): State<AppState>,
    Path((group_id, goal_id)): Path<(Uuid, Uuid)>,
    creds: Credentials,
) -> Result<Json<DeleteGoalResponse>, ApiError> {
    authorize(&state, &creds, group_id, Relation::Owner).await?;

    GoalRepository::new(state.pool.clone())
        .delete(group_id, goal_id)
        .await?;

    info!(group_id = %group_id, goal_id = %goal_id, "Goal deleted");

    Ok(Json(DeleteGoalResponse { success: true }))
}
