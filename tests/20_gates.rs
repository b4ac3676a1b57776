mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use estate_api::config::AppConfig;
use estate_api::types::Role;

#[tokio::test]
async fn role_gated_route_without_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app.post("/api/leases", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Authentication required");
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/auth/me", Some("not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn wrong_role_is_forbidden() {
    let app = TestApp::new();
    let tenant = app.seed_user(Role::Tenant).await;

    let (status, body) = app.post("/api/leases", Some(&tenant.token), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied. Required role: landlord");

    let (status, _) = app.get("/api/kyc", Some(&tenant.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn public_routes_ignore_missing_identity() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/properties", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 0);

    let (status, body) = app.get("/api/subscriptions/plans", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plans"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn unknown_sort_key_is_a_bad_request() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/properties?sort=cheapest", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_route_uses_the_error_envelope() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn signup_then_me_round_trip() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            json!({"name": "Ravi Kumar", "email": "Ravi@Example.com", "password": "hunter2hunter2", "role": "landlord"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let token = body["data"]["token"].as_str().expect("token").to_string();
    assert_eq!(body["data"]["user"]["email"], "ravi@example.com");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "landlord");

    let (status, body) = app.get("/api/subscriptions/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plan"], "FREE");

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "ravi@example.com", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_cannot_claim_admin() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/auth/signup",
            None,
            json!({"name": "Mallory", "email": "mallory@example.com", "password": "hunter2hunter2", "role": "admin"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "role");
}

#[tokio::test]
async fn router_serves_with_request_logging_disabled() {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    let app = TestApp::with_config(config);

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = app.get("/api/properties/mine", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");
}
