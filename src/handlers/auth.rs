use axum::{extract::State, http::header, response::IntoResponse};
use chrono::Utc;
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::clean;
use crate::auth::password::{hash_password, verify_password};
use crate::config::SecurityConfig;
use crate::database::models::subscription::Subscription;
use crate::database::models::user::{normalize_email, User, UserProfile};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    #[validate(length(min = 7, max = 20, message = "Phone number must be between 7 and 20 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 7, max = 20, message = "Phone number must be between 7 and 20 characters"))]
    pub phone: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

/// POST /api/auth/signup - create an account on the FREE plan
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = body.role.unwrap_or(Role::User);
    if !role.is_self_assignable() {
        return Err(ApiError::invalid_field(
            "role",
            "Role must be one of: user, tenant, landlord",
        ));
    }

    let users = state.collection::<User>();
    let email = normalize_email(&body.email);
    if users.exists(Filter::new().eq("email", &email)).await? {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let now = Utc::now();
    let password_hash = hash_password(body.password, state.config.security.bcrypt_cost).await?;
    let mut user = User::new(body.name.trim().to_string(), &email, password_hash, role, now);
    user.phone = clean(body.phone);
    users.insert(&user).await?;

    let subscription = Subscription::free(user.id, now, state.config.subscription.refresh_days);
    state.collection::<Subscription>().insert(&subscription).await?;

    tracing::info!(user_id = %user.id, role = %role, "user signed up");
    let token = state.tokens.issue(user.id, &user.email, user.role, now)?;
    let cookie = session_cookie(&state.config.security, &token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::created(Session { token, user: user.profile() }).message("Account created"),
    ))
}

/// POST /api/auth/login - exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .collection::<User>()
        .find_one(Filter::new().eq("email", normalize_email(&body.email)))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(body.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = %user.id, "failed login attempt");
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id, &user.email, user.role, Utc::now())?;
    let cookie = session_cookie(&state.config.security, &token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::success(Session { token, user: user.profile() }).message("Logged in"),
    ))
}

/// POST /api/auth/logout - clear the session cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let mut cookie = Cookie::build((state.config.security.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    (
        [(header::SET_COOKIE, cookie.to_string())],
        ApiResponse::success(()).message("Logged out"),
    )
}

/// GET /api/auth/me - current user profile
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserProfile> {
    let record = state.collection::<User>().get_404(user.user_id).await?;
    Ok(ApiResponse::success(record.profile()))
}

/// PATCH /api/users/me - update own profile fields
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    let users = state.collection::<User>();
    let mut record = users.get_404(user.user_id).await?;

    if let Some(name) = body.name {
        record.name = name.trim().to_string();
    }
    if body.phone.is_some() {
        record.phone = clean(body.phone);
    }
    if body.avatar_url.is_some() {
        record.avatar_url = clean(body.avatar_url);
    }
    record.updated_at = Utc::now();
    users.save(&record).await?;

    Ok(ApiResponse::success(record.profile()).message("Profile updated"))
}

fn session_cookie(security: &SecurityConfig, token: &str) -> String {
    Cookie::build((security.cookie_name.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(security.cookie_secure)
        .build()
        .to_string()
}
