mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::TestApp;
use estate_api::database::models::property::{Property, PropertyStatus};
use estate_api::types::Role;

#[tokio::test]
async fn commercial_shares_cannot_exceed_total() {
    let app = TestApp::new();
    let landlord = app.seed_user(Role::Landlord).await;

    let mut body = json!({
        "title": "Grade A office floor",
        "description": "Leased office floor in the business district",
        "address": {"line": "1 Bandra Kurla Complex", "city": "Mumbai", "state": "Maharashtra"},
        "commercialType": "office",
        "spvId": "spv-bkc-001",
        "totalShares": 1000,
        "availableShares": 1200,
        "pricePerShare": 2500,
        "expectedYield": 8.5
    });

    let (status, response) = app.post("/api/commercial", Some(&landlord.token), body.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "VALIDATION_ERROR");
    assert_eq!(response["details"][0]["field"], "availableShares");

    body["availableShares"] = json!(400);
    let (status, response) = app.post("/api/commercial", Some(&landlord.token), body.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", response);
    assert_eq!(response["data"]["availableShares"], 400);

    let (status, _) = app.post("/api/commercial", Some(&landlord.token), body).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn commercial_listing_is_closed_to_tenants() {
    let app = TestApp::new();
    let tenant = app.seed_user(Role::Tenant).await;

    let (status, _) = app.post("/api/commercial", Some(&tenant.token), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn tenant_cannot_inquire_on_own_property() {
    let app = TestApp::new();
    let tenant = app.seed_user(Role::Tenant).await;
    let own = app.seed_property(tenant.id(), "Delhi", 7_000_000, 1000).await;

    let (status, body) = app
        .post(
            &format!("/api/properties/{}/inquiries", own.id),
            Some(&tenant.token),
            json!({"message": "Is this still available?"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You cannot inquire on your own property");
}

#[tokio::test]
async fn tenant_inquiry_notifies_the_owner() {
    let app = TestApp::new();
    let owner = app.seed_user(Role::Landlord).await;
    let tenant = app.seed_user(Role::Tenant).await;
    let property = app.seed_property(owner.id(), "Delhi", 7_000_000, 1000).await;

    let (status, body) = app
        .post(
            &format!("/api/properties/{}/inquiries", property.id),
            Some(&tenant.token),
            json!({"message": "Is this still available?", "contactPhone": "+91 99999 11111"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "new");
    let inquiry_id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body) = app.get("/api/notifications?unread=true", Some(&owner.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["kind"], "inquiry");

    let (status, body) = app
        .get(&format!("/api/properties/{}/inquiries", property.id), Some(&owner.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = app
        .patch(
            &format!("/api/inquiries/{}/status", inquiry_id),
            Some(&owner.token),
            json!({"status": "contacted"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "contacted");

    let (status, body) = app
        .patch(
            &format!("/api/inquiries/{}/status", inquiry_id),
            Some(&owner.token),
            json!({"status": "new"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Cannot move inquiry from contacted to new");
}

#[tokio::test]
async fn duplicate_favorite_conflicts() {
    let app = TestApp::new();
    let owner = app.seed_user(Role::Landlord).await;
    let user = app.seed_user(Role::User).await;
    let property = app.seed_property(owner.id(), "Jaipur", 4_000_000, 800).await;
    let uri = format!("/api/properties/{}/favorite", property.id);

    let (status, _) = app.post(&uri, Some(&user.token), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post(&uri, Some(&user.token), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Property is already in your favorites");

    let (status, body) = app.get("/api/favorites", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = app.delete(&uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overlapping_agent_appointments_conflict() {
    let app = TestApp::new();
    let agent = app.seed_user(Role::Agent).await;
    let buyer = app.seed_user(Role::User).await;
    let other = app.seed_user(Role::Tenant).await;
    let start = Utc::now() + Duration::days(2);

    let (status, body) = app
        .post(
            "/api/appointments",
            Some(&buyer.token),
            json!({"agentId": agent.id(), "scheduledAt": start}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["durationMinutes"], 30);

    let (status, _) = app
        .post(
            "/api/appointments",
            Some(&other.token),
            json!({"agentId": agent.id(), "scheduledAt": start + Duration::minutes(15)}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            "/api/appointments",
            Some(&other.token),
            json!({"agentId": agent.id(), "scheduledAt": start + Duration::minutes(30)}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get("/api/agent/appointments", Some(&agent.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn appointments_must_be_in_the_future() {
    let app = TestApp::new();
    let agent = app.seed_user(Role::Agent).await;
    let buyer = app.seed_user(Role::User).await;

    let (status, body) = app
        .post(
            "/api/appointments",
            Some(&buyer.token),
            json!({"agentId": agent.id(), "scheduledAt": Utc::now() - Duration::hours(1)}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "scheduledAt");
}

#[tokio::test]
async fn far_future_appointments_are_rejected() {
    let app = TestApp::new();
    let agent = app.seed_user(Role::Agent).await;
    let buyer = app.seed_user(Role::User).await;

    let (status, body) = app
        .post(
            "/api/appointments",
            Some(&buyer.token),
            json!({"agentId": agent.id(), "scheduledAt": "+262142-12-31T23:00:00Z", "durationMinutes": 240}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"][0]["field"], "scheduledAt");

    let (status, _) = app
        .post(
            "/api/appointments",
            Some(&buyer.token),
            json!({"agentId": agent.id(), "scheduledAt": Utc::now() + Duration::days(400)}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn appointment_transition_errors_use_status_names() {
    let app = TestApp::new();
    let agent = app.seed_user(Role::Agent).await;
    let buyer = app.seed_user(Role::User).await;

    let (status, body) = app
        .post(
            "/api/appointments",
            Some(&buyer.token),
            json!({"agentId": agent.id(), "scheduledAt": Utc::now() + Duration::days(3)}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .patch(
            &format!("/api/appointments/{}/status", id),
            Some(&agent.token),
            json!({"status": "completed"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Cannot change appointment from pending to completed");
}

#[tokio::test]
async fn property_search_filters_by_city_and_price() {
    let app = TestApp::new();
    let owner = app.seed_user(Role::Landlord).await;
    app.seed_property(owner.id(), "Kochi", 3_000_000, 900).await;
    app.seed_property(owner.id(), "Kochi", 6_000_000, 1300).await;
    app.seed_property(owner.id(), "Mysuru", 3_500_000, 1000).await;

    let (status, body) = app.get("/api/properties?city=kochi&sort=price_asc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["items"][0]["price"], 3_000_000.0);

    let (status, body) = app.get("/api/properties?city=Kochi&minPrice=5000000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = app.get("/api/properties?limit=1&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["totalPages"], 3);
}

#[tokio::test]
async fn agent_reviews_are_one_per_reviewer() {
    let app = TestApp::new();
    let agent = app.seed_user(Role::Agent).await;
    let user = app.seed_user(Role::User).await;
    let uri = format!("/api/agents/{}/reviews", agent.id());

    let (status, _) = app
        .post(&uri, Some(&agent.token), json!({"rating": 5, "comment": "Great agent"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(&uri, Some(&user.token), json!({"rating": 4, "comment": "Helpful and quick"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(&uri, Some(&user.token), json!({"rating": 2, "comment": "Changed my mind"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get(&format!("/api/agents/{}", agent.id()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"]["count"], 1);
    assert_eq!(body["data"]["rating"]["average"], 4.0);
}

#[tokio::test]
async fn expired_listings_leave_the_active_search() {
    let app = TestApp::new();
    let landlord = app.seed_user(Role::Landlord).await;

    let (status, body) = app
        .post(
            "/api/properties",
            Some(&landlord.token),
            json!({
                "title": "Lake view studio apartment",
                "description": "Compact studio a short walk from the lake",
                "propertyType": "apartment",
                "listingType": "rent",
                "price": 18000,
                "areaSqft": 450,
                "address": {"line": "9 Lake Road", "city": "Udaipur", "state": "Rajasthan"},
                "expiresAt": Utc::now() - Duration::days(1)
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "expired");

    let (_, body) = app.get("/api/properties?city=Udaipur", None).await;
    assert_eq!(body["data"]["total"], 0);
    let (_, body) = app.get("/api/properties?city=Udaipur&status=expired", None).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn listings_that_lapse_after_creation_are_filtered_as_expired() {
    let app = TestApp::new();
    let owner = app.seed_user(Role::Landlord).await;
    let mut lapsed = app.seed_property(owner.id(), "Shimla", 4_000_000, 800).await;
    app.seed_property(owner.id(), "Shimla", 5_000_000, 900).await;

    lapsed.expires_at = Some(Utc::now() - Duration::minutes(5));
    app.state
        .collection::<Property>()
        .save(&lapsed)
        .await
        .expect("listing saved");

    let (status, body) = app.get("/api/properties?city=Shimla&status=active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["status"], "active");

    let (_, body) = app.get("/api/properties?city=Shimla&status=expired", None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], lapsed.id.to_string());

    let stored = app
        .state
        .collection::<Property>()
        .get_404(lapsed.id)
        .await
        .expect("listing exists");
    assert_eq!(stored.status, PropertyStatus::Expired);
}
