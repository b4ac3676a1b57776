mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn signup_sets_session_cookie_usable_for_me() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let email = format!("smoke-{}@example.com", uuid::Uuid::new_v4().simple());

    let res = client
        .post(format!("{}/api/auth/signup", server.base_url))
        .json(&serde_json::json!({
            "name": "Smoke Test",
            "email": email,
            "password": "correct-horse-battery"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("session cookie set");

    let res = client
        .get(format!("{}/api/auth/me", server.base_url))
        .header(reqwest::header::COOKIE, cookie)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["email"], email.as_str());
    assert_eq!(body["data"]["role"], "user");
    Ok(())
}
