//! Extractors for bearer-authenticated users.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;
pub use crate::middleware::user_auth::UserAuth;

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already verified by `require_user_auth`.
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        match UserAuth::from_headers(&state.jwt, &parts.headers) {
            Some(Ok(auth)) => Ok(auth),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Bearer token rejected");
                Err(ApiError::Unauthorized(
                    "Neplatný nebo expirovaný token".into(),
                ))
            }
            None => Err(ApiError::Unauthorized("Chybí přihlašovací token".into())),
        }
    }
}

/// Bearer user if a valid token was sent. Invalid tokens are treated as absent.
#[derive(Debug, Clone)]
pub struct OptionalUserAuth(pub Option<UserAuth>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(OptionalUserAuth(Some(auth.clone())));
        }

        let auth = match UserAuth::from_headers(&state.jwt, &parts.headers) {
            Some(Ok(auth)) => Some(auth),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
                None
            }
            None => None,
        };
        Ok(OptionalUserAuth(auth))
    }
}
