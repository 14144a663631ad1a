//! Integration tests for the profile and health endpoints.
//!
//! These tests require a running PostgreSQL instance.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    cleanup_owner, create_test_app, create_test_pool, get_request, get_request_with_auth,
    issue_token, json_request, parse_response_body, run_migrations, send, test_config, TestOwner,
};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_profile_exists_only_after_upsert() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let app = create_test_app(test_config(), pool.clone());

    let user_id = Uuid::new_v4();
    let token = issue_token(user_id);

    let before = parse_response_body(send(&app, get_request_with_auth("/api/v1/auth/profile", &token)).await).await;
    assert_eq!(before["exists"], false);
    assert!(before["user"].is_null());

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/auth/profile",
            json!({ "fullName": "  Mgr. Novák ", "role": "teacher" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let saved = parse_response_body(response).await;
    assert_eq!(saved["fullName"], "Mgr. Novák");
    assert_eq!(saved["email"], format!("{}@example.com", user_id.simple()));

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/auth/profile",
            json!({ "fullName": "Mgr. Novák", "role": "student", "email": "novak@skola.cz" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let after = parse_response_body(send(&app, get_request_with_auth("/api/v1/auth/profile", &token)).await).await;
    assert_eq!(after["exists"], true);
    assert_eq!(after["user"]["role"], "student");
    assert_eq!(after["user"]["email"], "novak@skola.cz");

    cleanup_owner(&pool, &TestOwner { user_id, token }).await;
}

#[tokio::test]
async fn test_profile_validation_and_auth() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let app = create_test_app(test_config(), pool.clone());

    let response = send(&app, get_request("/api/v1/auth/profile")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = issue_token(Uuid::new_v4());
    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/auth/profile",
            json!({ "fullName": "Jana", "role": "teacher", "email": "not-an-email" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = parse_response_body(response).await;
    assert_eq!(json["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_health_endpoints() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    let app = create_test_app(test_config(), pool.clone());

    let live = send(&app, get_request("/api/health/live")).await;
    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(parse_response_body(live).await["status"], "alive");

    let ready = send(&app, get_request("/api/health/ready")).await;
    assert_eq!(ready.status(), StatusCode::OK);

    let health = parse_response_body(send(&app, get_request("/api/health")).await).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"]["connected"], true);
    assert_eq!(health["assistant"]["configured"], false);
}

#[tokio::test]
async fn test_database_ping() {
    let pool = create_test_pool().await;
    tokio_test::assert_ok!(persistence::db::ping(&pool).await);
}
