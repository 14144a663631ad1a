//! Caller credentials for group-scoped routes.
//!
//! Owners authenticate with a bearer token. Participants identify with the
//! device ID they joined with, sent in the `X-Device-Id` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::user_auth::{OptionalUserAuth, UserAuth};

pub const DEVICE_ID_HEADER: &str = "X-Device-Id";

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: Option<UserAuth>,
    pub device_id: Option<String>,
}

impl Credentials {
    pub fn new(user: Option<UserAuth>, device_id: Option<String>) -> Self {
        Self {
            user,
            device_id: device_id
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Credentials {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalUserAuth(user) = OptionalUserAuth::from_request_parts(parts, state).await?;
        let device_id = parts
            .headers
            .get(DEVICE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Credentials::new(user, device_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_device_id_is_dropped() {
        let creds = Credentials::new(None, Some("   ".into()));
        assert!(creds.device_id.is_none());

        let creds = Credentials::new(None, Some(" tablet-3 ".into()));
        assert_eq!(creds.device_id.as_deref(), Some("tablet-3"));
    }
}
