use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::{ChatResponder, CompletionClient};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::realtime::{poll, socket, BusSettings, EventBus};
use crate::routes::{
    chat, goals, groups, health, help_requests, messages, participants, profile, progress,
};
use crate::services::OpenAiCompletionClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub jwt: Arc<JwtConfig>,
    pub bus: EventBus,
    pub chat: ChatResponder,
}

impl AppState {
    /// Builds the shared state. Fails only when the JWT keys cannot be parsed.
    pub fn new(
        config: Config,
        pool: PgPool,
        completion: Option<Arc<dyn CompletionClient>>,
    ) -> Result<Self, JwtError> {
        let jwt = JwtConfig::from_rsa_pem(
            &config.jwt.public_key,
            config.jwt.private_key.as_deref(),
            config.jwt.leeway_secs,
        )?
        .with_issuer(config.jwt.issuer.clone())
        .with_audience(config.jwt.audience.clone());

        // Create rate limiter if rate limiting is enabled (rate_limit_per_minute > 0)
        let rate_limiter = if config.security.rate_limit_per_minute > 0 {
            Some(Arc::new(RateLimiterState::new(
                config.security.rate_limit_per_minute,
            )))
        } else {
            None
        };

        let bus = EventBus::new(BusSettings {
            replay_capacity: config.realtime.replay_capacity,
            replay_retention: chrono::Duration::seconds(
                config.realtime.replay_retention_secs as i64,
            ),
        });

        let chat = ChatResponder::new(completion, config.assistant.system_prompt.clone());

        Ok(Self {
            pool,
            config: Arc::new(config),
            rate_limiter,
            jwt: Arc::new(jwt),
            bus,
            chat,
        })
    }
}

/// Completion client from config, or `None` when assisted mode is unconfigured.
fn completion_client(config: &Config) -> Option<Arc<dyn CompletionClient>> {
    match OpenAiCompletionClient::new(&config.assistant) {
        Ok(client) => {
            info!(model = %config.assistant.model, "Assisted chat enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!(error = %e, "Assisted chat disabled, replies will use the fallback");
            None
        }
    }
}

/// Builds the shared state and the router over it. The state is returned
/// too so startup can hand the bus to background jobs.
pub fn create_app(config: Config, pool: PgPool) -> Result<(Router, AppState), JwtError> {
    let completion = completion_client(&config);
    let state = AppState::new(config, pool, completion)?;
    Ok((create_router(state.clone()), state))
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Routes that need a bearer token for every call
    let user_routes = Router::new()
        .route(
            "/api/v1/auth/profile",
            get(profile::get_profile).put(profile::upsert_profile),
        )
        .route(
            "/api/v1/groups",
            post(groups::create_group).get(groups::list_groups),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        // Auth runs first (outermost layer = runs first)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Group-scoped routes. Access is checked per handler against the group:
    // owners by bearer token, participants by device ID.
    let group_routes = Router::new()
        .route(
            "/api/v1/groups/:group_id",
            get(groups::get_group)
                .patch(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/api/v1/groups/:group_id/goals",
            post(goals::create_goal).get(goals::list_goals),
        )
        .route(
            "/api/v1/groups/:group_id/goals/:goal_id",
            put(goals::update_goal).delete(goals::delete_goal),
        )
        .route(
            "/api/v1/groups/:group_id/goals/:goal_id/progress",
            put(progress::upsert_goal_progress),
        )
        .route("/api/v1/progress/:progress_id", put(progress::update_progress))
        .route(
            "/api/v1/groups/:group_id/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route("/api/v1/groups/:group_id/chat", post(chat::send_chat_message))
        .route(
            "/api/v1/groups/:group_id/help-requests",
            post(help_requests::create_help_request).get(help_requests::list_help_requests),
        )
        .route(
            "/api/v1/groups/:group_id/help-requests/:request_id/resolve",
            post(help_requests::resolve_help_request),
        )
        .route(
            "/api/v1/groups/:group_id/participants/:participant_id/help-requests/resolve",
            post(help_requests::resolve_all_for_participant),
        )
        .route("/api/v1/participants/join", post(participants::join_group))
        .route("/api/v1/realtime/:group_id", get(poll::poll_updates))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Long-lived sockets stay outside the request timeout and rate limit.
    let socket_routes = Router::new().route("/api/v1/ws/:group_id", get(socket::ws_handler));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let http_routes = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(group_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    Router::new()
        .merge(http_routes)
        .merge(socket_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
