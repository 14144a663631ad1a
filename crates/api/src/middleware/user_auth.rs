//! Bearer token authentication.
//!
//! Tokens are issued by the identity provider and verified here with its
//! public key. The `sub` claim is the user ID.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated user from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl UserAuth {
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt.verify(token)?;
        let user_id = extract_user_id(&claims)?;
        Ok(UserAuth {
            user_id,
            email: claims.email,
        })
    }

    /// Verifies the bearer token in `headers`, if there is one.
    ///
    /// `None` means no `Authorization: Bearer` header was sent.
    pub fn from_headers(jwt: &JwtConfig, headers: &HeaderMap) -> Option<Result<Self, JwtError>> {
        bearer_token(headers).map(|token| Self::validate(jwt, token))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a valid bearer token and stores [`UserAuth`]
/// in request extensions.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match UserAuth::from_headers(&state.jwt, req.headers()) {
        Some(Ok(auth)) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Some(Err(e)) => {
            tracing::debug!(error = %e, "Bearer token rejected");
            ApiError::Unauthorized("Neplatný nebo expirovaný token".into()).into_response()
        }
        None => ApiError::Unauthorized("Chybí přihlašovací token".into()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_validate_round_trip() {
        let jwt = JwtConfig::from_secret("unit-test-secret");
        let user_id = Uuid::new_v4();
        let token = jwt
            .issue_token(user_id, Some("ucitel@skola.cz"), 3600)
            .unwrap();

        let auth = UserAuth::from_headers(&jwt, &headers(&format!("Bearer {token}")))
            .unwrap()
            .unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.email.as_deref(), Some("ucitel@skola.cz"));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let jwt = JwtConfig::from_secret("unit-test-secret");
        assert!(UserAuth::validate(&jwt, "not-a-jwt").is_err());
    }
}
