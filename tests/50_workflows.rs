mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use common::{otp_from_html, TestApp};
use estate_api::database::models::kyc::KycRequest;
use estate_api::types::Role;

fn kyc_body(pan: &str) -> serde_json::Value {
    json!({
        "fullName": "Meera Nair",
        "panNumber": pan,
        "documentUrl": "https://files.example.com/pan/meera.pdf"
    })
}

/// Submit and accept a KYC request, returning its id and the mailed OTP.
async fn accepted_kyc(app: &TestApp, user: &common::Seeded, admin: &common::Seeded) -> (String, String) {
    let (status, body) = app.post("/api/kyc", Some(&user.token), kyc_body("ABCDE1234F")).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body) = app
        .patch(&format!("/api/kyc/{}", id), Some(&admin.token), json!({"status": "accepted"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "accepted");
    assert!(body["data"]["otpHash"].is_null());

    let email = app.mailer.last_to(&user.user.email).await.expect("otp email sent");
    (id, otp_from_html(&email.html))
}

#[tokio::test]
async fn kyc_submission_validates_pan_and_blocks_duplicates() {
    let app = TestApp::new();
    let user = app.seed_user(Role::Tenant).await;

    let (status, body) = app.post("/api/kyc", Some(&user.token), kyc_body("ABCD1234F")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "panNumber");

    let (status, body) = app.post("/api/kyc", Some(&user.token), kyc_body(" abcde1234f ")).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["panNumber"], "ABCDE1234F");

    let (status, _) = app.post("/api/kyc", Some(&user.token), kyc_body("ABCDE1234F")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn kyc_otp_verifies_before_expiry() {
    let app = TestApp::new();
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::Tenant).await;

    let (id, otp) = accepted_kyc(&app, &user, &admin).await;
    assert_eq!(otp.len(), 6);
    assert!(otp.chars().all(|c| c.is_ascii_digit()));

    let stored = app
        .state
        .collection::<KycRequest>()
        .get_404(Uuid::parse_str(&id).expect("uuid"))
        .await
        .expect("kyc request");
    let expires_at = stored.otp_expires_at.expect("expiry set");
    let ttl = expires_at - Utc::now();
    assert!(ttl > Duration::minutes(9) && ttl <= Duration::minutes(10));

    let wrong = if otp == "000000" { "111111" } else { "000000" };
    let (status, body) = app.post("/api/kyc/verify-otp", Some(&user.token), json!({"otp": wrong})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP");

    let (status, body) = app.post("/api/kyc/verify-otp", Some(&user.token), json!({"otp": otp})).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["otpVerified"], true);

    let (_, body) = app.get("/api/auth/me", Some(&user.token)).await;
    assert_eq!(body["data"]["kycVerified"], true);

    let (status, _) = app
        .patch(&format!("/api/kyc/{}", id), Some(&admin.token), json!({"status": "rejected", "reason": "late"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn kyc_otp_expires_and_can_be_resent() {
    let app = TestApp::new();
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::Tenant).await;

    let (id, otp) = accepted_kyc(&app, &user, &admin).await;

    let requests = app.state.collection::<KycRequest>();
    let mut stored = requests
        .get_404(Uuid::parse_str(&id).expect("uuid"))
        .await
        .expect("kyc request");
    stored.otp_expires_at = Some(Utc::now() - Duration::minutes(1));
    requests.save(&stored).await.expect("saved");

    let (status, body) = app.post("/api/kyc/verify-otp", Some(&user.token), json!({"otp": otp})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OTP expired");

    let (status, body) = app.post("/api/kyc/resend-otp", Some(&user.token), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let fresh = otp_from_html(&app.mailer.last_to(&user.user.email).await.expect("email").html);

    let (status, _) = app.post("/api/kyc/verify-otp", Some(&user.token), json!({"otp": fresh})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.mailer.sent().await.len(), 2);
}

#[tokio::test]
async fn kyc_rejection_requires_a_reason() {
    let app = TestApp::new();
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::Tenant).await;

    let (_, body) = app.post("/api/kyc", Some(&user.token), kyc_body("ABCDE1234F")).await;
    let id = body["data"]["id"].as_str().expect("id").to_string();
    let uri = format!("/api/kyc/{}", id);

    let (status, body) = app.patch(&uri, Some(&admin.token), json!({"status": "rejected"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "reason");

    let (status, body) = app
        .patch(&uri, Some(&admin.token), json!({"status": "rejected", "reason": "Document is blurry"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rejectionReason"], "Document is blurry");

    // A rejected request no longer blocks a new submission
    let (status, _) = app.post("/api/kyc", Some(&user.token), kyc_body("ABCDE1234F")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn verification_approval_elevates_role() {
    let app = TestApp::new();
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::User).await;

    let (status, body) = app
        .post("/api/verification", Some(&user.token), json!({"requestedRole": "agent", "agencyName": "Nest Realty"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "licenseNumber");

    let request = json!({
        "requestedRole": "agent",
        "licenseNumber": "MH-RE-2291",
        "agencyName": "Nest Realty",
        "experienceYears": 6
    });
    let (status, body) = app.post("/api/verification", Some(&user.token), request.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, _) = app.post("/api/verification", Some(&user.token), request).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Not an agent yet
    let (status, _) = app.get("/api/agent/appointments", Some(&user.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch(&format!("/api/verification/{}", id), Some(&admin.token), json!({"status": "approved"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "approved");

    // The role is reloaded per request, so the existing token picks it up
    let (_, body) = app.get("/api/auth/me", Some(&user.token)).await;
    assert_eq!(body["data"]["role"], "agent");
    assert_eq!(body["data"]["agentInfo"]["licenseNumber"], "MH-RE-2291");

    let (status, _) = app.get("/api/agent/appointments", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .patch(&format!("/api/verification/{}", id), Some(&admin.token), json!({"status": "rejected"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
