#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use estate_api::config::AppConfig;
use estate_api::database::models::property::{ListingType, Property, PropertyStatus, PropertyType};
use estate_api::database::models::subscription::Subscription;
use estate_api::database::models::user::User;
use estate_api::database::models::Address;
use estate_api::database::MemoryStore;
use estate_api::services::mailer::MemoryMailer;
use estate_api::types::Role;
use estate_api::AppState;

/// Full router over an in-memory store, driven in-process.
pub struct TestApp {
    pub state: AppState,
    pub mailer: Arc<MemoryMailer>,
    router: Router,
}

/// A user inserted straight into the store, with a token for it.
pub struct Seeded {
    pub user: User,
    pub token: String,
}

impl Seeded {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let mailer = Arc::new(MemoryMailer::new());
        let state = AppState::new(Arc::new(MemoryStore::new()), config, mailer.clone());
        let router = estate_api::app(state.clone());
        Self { state, mailer, router }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Insert a KYC-verified user on the FREE plan and issue it a token.
    pub async fn seed_user(&self, role: Role) -> Seeded {
        let now = Utc::now();
        let email = format!("{}-{}@example.com", role, Uuid::new_v4().simple());
        let mut user = User::new(format!("Test {}", role), &email, "not-a-real-hash".to_string(), role, now);
        user.phone = Some("+91 98200 00000".to_string());
        user.kyc_verified = true;
        self.state.collection::<User>().insert(&user).await.expect("user inserted");

        let subscription = Subscription::free(user.id, now, self.state.config.subscription.refresh_days);
        self.state
            .collection::<Subscription>()
            .insert(&subscription)
            .await
            .expect("subscription inserted");

        let token = self
            .state
            .tokens
            .issue(user.id, &user.email, user.role, now)
            .expect("token issued");
        Seeded { user, token }
    }

    pub async fn subscription_of(&self, user_id: Uuid) -> Subscription {
        self.state
            .collection::<Subscription>()
            .find_one(estate_api::filter::Filter::new().eq("userId", user_id))
            .await
            .expect("store readable")
            .expect("subscription exists")
    }

    pub async fn save_subscription(&self, subscription: &Subscription) {
        self.state
            .collection::<Subscription>()
            .save(subscription)
            .await
            .expect("subscription saved");
    }

    /// Insert an active listing directly, bypassing listing credits.
    pub async fn seed_property(&self, owner_id: Uuid, city: &str, price: i64, area_sqft: u32) -> Property {
        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            owner_id,
            agent_id: None,
            title: format!("Two bedroom flat in {}", city),
            description: "Bright flat close to the metro station".to_string(),
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Sale,
            price: Decimal::from(price),
            area_sqft: Some(area_sqft),
            bedrooms: Some(2),
            bathrooms: Some(2),
            address: address(city),
            location: None,
            amenities: vec![],
            images: vec![],
            virtual_tour_url: Some("https://tours.example.com/flat".to_string()),
            status: PropertyStatus::Active,
            views: 0,
            expires_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state
            .collection::<Property>()
            .insert(&property)
            .await
            .expect("property inserted");
        property
    }
}

pub fn address(city: &str) -> Address {
    Address {
        line: "12 Residency Road".to_string(),
        city: city.to_string(),
        state: "Karnataka".to_string(),
        country: "India".to_string(),
        postal_code: Some("560025".to_string()),
    }
}

/// Pull the six-digit code out of an OTP email body.
pub fn otp_from_html(html: &str) -> String {
    let start = html.find("<h2>").expect("otp heading") + 4;
    let end = html.find("</h2>").expect("otp heading end");
    html[start..end].to_string()
}

// Spawned-binary harness for smoke tests against the real server process

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_estate-api"));
        cmd.arg("--memory")
            .arg("--port")
            .arg(port.to_string())
            .env("APP_ENV", "development")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
