//! Per-caller rate limiting.
//!
//! Callers are keyed by device ID, then by a hash of their bearer token, then
//! by forwarded IP. Requests with none of these share the `anonymous` bucket.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, PoisonError, RwLock},
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::credentials::DEVICE_ID_HEADER;

type CallerRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const FALLBACK_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(120) {
    Some(n) => n,
    None => unreachable!(),
};

/// Rate limiter table shared by all requests.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<String, Arc<CallerRateLimiter>>>,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            rate_limit_per_minute,
        }
    }

    fn get_or_create_limiter(&self, key: &str) -> Arc<CallerRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(limiter) = limiters.get(key) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap_or_else(PoisonError::into_inner);
        limiters
            .entry(key.to_string())
            .or_insert_with(|| {
                let per_minute =
                    NonZeroU32::new(self.rate_limit_per_minute).unwrap_or(FALLBACK_PER_MINUTE);
                Arc::new(GovRateLimiter::direct(Quota::per_minute(per_minute)))
            })
            .clone()
    }

    /// Returns the retry-after delay in seconds when the caller is over quota.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(key);
        limiter.check().map_err(|not_until| {
            not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1)
        })
    }

    pub fn tracked_callers(&self) -> usize {
        self.limiters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_callers", &self.tracked_callers())
            .finish()
    }
}

/// Derives the limiter key for a request.
pub fn caller_key(headers: &HeaderMap) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(device_id) = header_str(DEVICE_ID_HEADER) {
        return format!("device:{device_id}");
    }

    if let Some(token) = header_str(header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return format!("token:{}", shared::crypto::sha256_hex(token));
    }

    if let Some(ip) = header_str("x-forwarded-for").and_then(|v| v.split(',').next()) {
        return format!("ip:{}", ip.trim());
    }

    "anonymous".to_string()
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ref limiter) = state.rate_limiter {
        let key = caller_key(req.headers());
        if let Err(retry_after_secs) = limiter.check(&key) {
            tracing::debug!(caller = %key, retry_after_secs, "Rate limit exceeded");
            return ApiError::RateLimited { retry_after_secs }.into_response();
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_exhaustion() {
        let state = RateLimiterState::new(1);
        assert!(state.check("device:a").is_ok());
        let retry = state.check("device:a").unwrap_err();
        assert!(retry >= 1);
    }

    #[test]
    fn test_callers_are_independent() {
        let state = RateLimiterState::new(1);
        assert!(state.check("device:a").is_ok());
        assert!(state.check("device:b").is_ok());
        assert!(state.check("device:a").is_err());
        assert_eq!(state.tracked_callers(), 2);
    }

    #[test]
    fn test_limit_allows_quota() {
        let state = RateLimiterState::new(5);
        for i in 0..5 {
            assert!(state.check("anonymous").is_ok(), "request {i} should pass");
        }
        assert!(state.check("anonymous").is_err());
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let state = RateLimiterState::new(10);
        let a = state.get_or_create_limiter("x");
        let b = state.get_or_create_limiter("x");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_caller_key_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_key(&headers), "anonymous");

        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        assert_eq!(caller_key(&headers), "ip:10.0.0.1");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret-token"));
        assert!(caller_key(&headers).starts_with("token:"));
        assert!(!caller_key(&headers).contains("secret"));

        headers.insert(DEVICE_ID_HEADER, HeaderValue::from_static("tablet-7"));
        assert_eq!(caller_key(&headers), "device:tablet-7");
    }
}
