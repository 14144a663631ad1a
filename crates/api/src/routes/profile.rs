//! Profile routes for the authenticated user.

use axum::{extract::State, Json};
use domain::models::user::{ProfileResponse, UpsertProfileRequest};
use domain::models::User;
use persistence::entities::UserRoleDb;
use persistence::repositories::UserRepository;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Returns the caller's profile.
///
/// GET /api/v1/auth/profile
///
/// A user that authenticated but never saved a profile gets `exists: false`.
pub async fn get_profile(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(user_auth.user_id)
        .await?
        .map(User::from);

    Ok(Json(ProfileResponse {
        exists: user.is_some(),
        user,
    }))
}

/// Creates or replaces the caller's profile.
///
/// PUT /api/v1/auth/profile
pub async fn upsert_profile(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<UpsertProfileRequest>,
) -> Result<Json<User>, ApiError> {
    request.validate()?;

    // Fall back to the e-mail carried in the token.
    let email = request.email.as_deref().or(user_auth.email.as_deref());

    let user = UserRepository::new(state.pool.clone())
        .upsert_profile(
            user_auth.user_id,
            email,
            request.full_name.trim(),
            UserRoleDb::from(request.role),
            request.avatar_url.as_deref(),
        )
        .await?;

    info!(user_id = %user_auth.user_id, role = %request.role, "Profile saved");

    Ok(Json(User::from(user)))
}
