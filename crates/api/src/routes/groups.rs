//! Group routes: creation, owner listing, detail views and management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::group::{
    CreateGroupRequest, DeleteGroupResponse, GroupSummary, ListGroupsResponse, UpdateGroupRequest,
};
use domain::models::{Goal, GoalProgress, Group, GroupView, HelpRequest, MessageView, Participant};
use domain::services::{build_owner_dashboard, build_participant_view, OwnerDashboardInput};
use persistence::repositories::{
    GoalProgressRepository, GoalRepository, GroupRepository, HelpRequestRepository,
    MessageRepository, ParticipantRepository,
};
use persistence::DbError;
use shared::crypto::generate_join_token;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{Credentials, UserAuth};
use crate::services::access::{authorize, load_group, Relation};

/// Attempts at drawing an unused join token before giving up.
const JOIN_TOKEN_ATTEMPTS: usize = 5;

/// Messages shown in the participant view.
const PARTICIPANT_VIEW_MESSAGES: i64 = 100;

/// Create a new group owned by the caller.
///
/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    request.validate()?;

    let repo = GroupRepository::new(state.pool.clone());
    let name = request.name.trim();
    let description = request.description.trim();

    let mut attempt = 0;
    let group = loop {
        attempt += 1;
        let token = generate_join_token();
        match repo
            .create(name, description, user_auth.user_id, &token)
            .await
        {
            Ok(group) => break group,
            Err(DbError::Conflict(constraint)) if attempt < JOIN_TOKEN_ATTEMPTS => {
                warn!(attempt, constraint = %constraint, "Join token collision, retrying");
            }
            // The owner FK fails until the caller has saved a profile.
            Err(DbError::NotFound) => {
                return Err(ApiError::validation(
                    "Před vytvořením skupiny je nutné uložit profil",
                ))
            }
            Err(e) => return Err(e.into()),
        }
    };

    info!(
        group_id = %group.id,
        owner_id = %user_auth.user_id,
        "Group created"
    );

    Ok((StatusCode::CREATED, Json(Group::from(group))))
}

/// List groups owned by the caller, newest first.
///
/// GET /api/v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ListGroupsResponse>, ApiError> {
    let data: Vec<GroupSummary> = GroupRepository::new(state.pool.clone())
        .list_by_owner(user_auth.user_id)
        .await?
        .into_iter()
        .map(GroupSummary::from)
        .collect();

    Ok(Json(ListGroupsResponse {
        count: data.len(),
        data,
    }))
}

/// Group detail shaped by the caller.
///
/// GET /api/v1/groups/:group_id
///
/// The owner gets the dashboard, a joined device gets its own view, and
/// everyone else gets the public metadata shown before joining.
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    creds: Credentials,
) -> Result<Json<GroupView>, ApiError> {
    let group = load_group(&state, group_id).await?;

    if creds.user.as_ref().is_some_and(|u| group.is_owned_by(u.user_id)) {
        let input = load_dashboard_input(&state, group.id).await?;
        return Ok(Json(GroupView::Owner(build_owner_dashboard(group, input))));
    }

    if let Some(device_id) = creds.device_id.as_deref() {
        let participant = ParticipantRepository::new(state.pool.clone())
            .find_by_group_and_device(group.id, device_id)
            .await?
            .map(Participant::from);

        if let Some(participant) = participant {
            let goals = load_goals(&state, group.id).await?;
            let rows = load_participant_progress(&state, participant.id).await?;
            let messages: Vec<MessageView> = MessageRepository::new(state.pool.clone())
                .list_by_group(group.id, None, PARTICIPANT_VIEW_MESSAGES)
                .await?
                .into_iter()
                .map(MessageView::from)
                .collect();

            return Ok(Json(GroupView::Participant(build_participant_view(
                &group,
                participant,
                &goals,
                &rows,
                messages,
            ))));
        }
    }

    Ok(Json(GroupView::Public(group.public_info())))
}

/// Update group metadata.
///
/// PATCH /api/v1/groups/:group_id
pub async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    creds: Credentials,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    request.validate()?;
    authorize(&state, &creds, group_id, Relation::Owner).await?;

    let group = GroupRepository::new(state.pool.clone())
        .update(
            group_id,
            request.name.as_deref().map(str::trim),
            request.description.as_deref().map(str::trim),
            request.is_active,
        )
        .await?;

    info!(group_id = %group_id, is_active = group.is_active, "Group updated");

    Ok(Json(Group::from(group)))
}

/// Delete a group with everything attached to it.
///
/// DELETE /api/v1/groups/:group_id
pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    creds: Credentials,
) -> Result<Json<DeleteGroupResponse>, ApiError> {
    let ctx = authorize(&state, &creds, group_id, Relation::Owner).await?;
    let owner_id = ctx.group().owner_id;

    let participants = ParticipantRepository::new(state.pool.clone())
        .count_by_group(group_id)
        .await?;

    GroupRepository::new(state.pool.clone())
        .delete(group_id, owner_id)
        .await?;
    state.bus.close_group(group_id).await;

    info!(
        group_id = %group_id,
        owner_id = %owner_id,
        participants,
        "Group deleted"
    );

    Ok(Json(DeleteGroupResponse {
        success: true,
        message: "Skupina byla smazána".into(),
    }))
}

pub(crate) async fn load_goals(state: &AppState, group_id: Uuid) -> Result<Vec<Goal>, ApiError> {
    Ok(GoalRepository::new(state.pool.clone())
        .list_by_group(group_id)
        .await?
        .into_iter()
        .map(Goal::from)
        .collect())
}

pub(crate) async fn load_participant_progress(
    state: &AppState,
    participant_id: Uuid,
) -> Result<Vec<GoalProgress>, ApiError> {
    Ok(GoalProgressRepository::new(state.pool.clone())
        .list_by_participant(participant_id)
        .await?
        .into_iter()
        .map(GoalProgress::from)
        .collect())
}

async fn load_dashboard_input(
    state: &AppState,
    group_id: Uuid,
) -> Result<OwnerDashboardInput, ApiError> {
    let goals = load_goals(state, group_id).await?;

    let participants = ParticipantRepository::new(state.pool.clone())
        .list_by_group(group_id)
        .await?
        .into_iter()
        .map(Participant::from)
        .collect();

    let progress = GoalProgressRepository::new(state.pool.clone())
        .list_by_group(group_id)
        .await?
        .into_iter()
        .map(GoalProgress::from)
        .collect();

    let message_counts = MessageRepository::new(state.pool.clone())
        .count_by_participant_in_group(group_id)
        .await?
        .into_iter()
        .map(|row| (row.participant_id, row.message_count))
        .collect();

    let help_requests = HelpRequestRepository::new(state.pool.clone())
        .list_by_group(group_id, None)
        .await?
        .into_iter()
        .map(HelpRequest::from)
        .collect();

    Ok(OwnerDashboardInput {
        goals,
        participants,
        progress,
        message_counts,
        help_requests,
    })
}
