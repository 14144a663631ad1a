//! Help requests: participants raise them, the owner resolves them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::help_request::{
    CreateHelpRequestRequest, ListHelpRequestsQuery, ResolveAllResponse,
};
use domain::models::{HelpRequest, RealtimeEvent};
use persistence::entities::HelpRequestStatusDb;
use persistence::repositories::HelpRequestRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Credentials;
use crate::services::access::{authorize, touch_participant, AuthContext, Relation};

fn owner_id(ctx: &AuthContext) -> Result<Uuid, ApiError> {
    match ctx {
        AuthContext::Owner { user_id, .. } => Ok(*user_id),
        AuthContext::Participant { .. } => Err(ApiError::Forbidden(
            "Žádosti o pomoc vyřizuje vlastník skupiny".into(),
        )),
    }
}

/// POST /api/v1/groups/:group_id/help-requests
pub async fn create_help_request(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    creds: Credentials,
    Json(request): Json<CreateHelpRequestRequest>,
) -> Result<(StatusCode, Json<HelpRequest>), ApiError> {
    request.validate()?;
    let ctx = authorize(&state, &creds, group_id, Relation::Participant).await?;
    let participant_id = ctx
        .participant()
        .map(|p| p.id)
        .ok_or_else(|| ApiError::Forbidden("O pomoc žádají pouze účastníci".into()))?;

    let help_request = HelpRequest::from(
        HelpRequestRepository::new(state.pool.clone())
            .create(participant_id, group_id, &request.resolved_reason())
            .await?,
    );
    touch_participant(&state, &ctx).await;

    state
        .bus
        .publish(group_id, RealtimeEvent::help_request(&help_request))
        .await;

    info!(
        group_id = %group_id,
        participant_id = %participant_id,
        request_id = %help_request.id,
        "Help request raised"
    );

    Ok((StatusCode::CREATED, Json(help_request)))
}

/// GET /api/v1/groups/:group_id/help-requests?status=
pub async fn list_help_requests(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ListHelpRequestsQuery>,
    creds: Credentials,
) -> Result<Json<Vec<HelpRequest>>, ApiError> {
    authorize(&state, &creds, group_id, Relation::Owner).await?;

    let requests = HelpRequestRepository::new(state.pool.clone())
        .list_by_group(group_id, query.status.map(HelpRequestStatusDb::from))
        .await?
        .into_iter()
        .map(HelpRequest::from)
        .collect();

    Ok(Json(requests))
}

/// Resolve one pending request. Resolving twice is a conflict.
///
/// POST /api/v1/groups/:group_id/help-requests/:request_id/resolve
pub async fn resolve_help_request(
    State(state): State<AppState>,
    Path((group_id, request_id)): Path<(Uuid, Uuid)>,
    creds: Credentials,
) -> Result<Json<HelpRequest>, ApiError> {
    let ctx = authorize(&state, &creds, group_id, Relation::Owner).await?;
    let resolved_by = owner_id(&ctx)?;

    let repo = HelpRequestRepository::new(state.pool.clone());
    let help_request = HelpRequest::from(repo.resolve(group_id, request_id, resolved_by).await?);

    state
        .bus
        .publish(group_id, RealtimeEvent::help_request(&help_request))
        .await;

    // Log-only; a failed count is ignored.
    let pending_left = repo.count_pending_by_group(group_id).await.ok();
    info!(
        group_id = %group_id,
        request_id = %request_id,
        pending_left = ?pending_left,
        "Help request resolved"
    );

    Ok(Json(help_request))
}

/// Resolve every pending request of one participant.
///
/// POST /api/v1/groups/:group_id/participants/:participant_id/help-requests/resolve
pub async fn resolve_all_for_participant(
    State(state): State<AppState>,
    Path((group_id, participant_id)): Path<(Uuid, Uuid)>,
    creds: Credentials,
) -> Result<Json<ResolveAllResponse>, ApiError> {
    let ctx = authorize(&state, &creds, group_id, Relation::Owner).await?;
    let resolved_by = owner_id(&ctx)?;

    let resolved: Vec<HelpRequest> = HelpRequestRepository::new(state.pool.clone())
        .resolve_all_for_participant(group_id, participant_id, resolved_by)
        .await?
        .into_iter()
        .map(HelpRequest::from)
        .collect();

    for help_request in &resolved {
        state
            .bus
            .publish(group_id, RealtimeEvent::help_request(help_request))
            .await;
    }

    info!(
        group_id = %group_id,
        participant_id = %participant_id,
        resolved = resolved.len(),
        "Help requests resolved for participant"
    );

    Ok(Json(ResolveAllResponse {
        resolved_count: resolved.len(),
        participant_id,
    }))
}
