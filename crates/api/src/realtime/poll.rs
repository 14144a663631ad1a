//! HTTP polling transport over the same event bus.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use domain::models::realtime::EventsSince;
use domain::models::Role;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Credentials;
use crate::services::access::{authorize, Relation};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuery {
    pub role: String,
    #[serde(default, alias = "lastUpdate")]
    pub since_timestamp: Option<String>,
}

/// Parses an RFC 3339 cursor, or falls back to `now - default_window`.
pub fn parse_since(
    raw: Option<&str>,
    now: DateTime<Utc>,
    default_window_secs: i64,
) -> Result<DateTime<Utc>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| ApiError::validation("Neplatný formát času (očekáváno RFC 3339)")),
        None => Ok(now - Duration::seconds(default_window_secs)),
    }
}

/// GET /api/v1/realtime/:group_id
///
/// Clients poll every few seconds and send back `serverTimestamp` as the
/// next `sinceTimestamp`.
pub async fn poll_updates(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<PollQuery>,
    creds: Credentials,
) -> Result<Json<EventsSince>, ApiError> {
    let role: Role = query.role.parse().map_err(ApiError::validation)?;
    let since = parse_since(
        query.since_timestamp.as_deref(),
        Utc::now(),
        state.config.realtime.poll_default_window_secs,
    )?;

    let relation = match role {
        Role::Owner => Relation::Owner,
        Role::Participant => Relation::Participant,
    };
    authorize(&state, &creds, group_id, relation).await?;

    Ok(Json(state.bus.since(group_id, role, since).await))
}
