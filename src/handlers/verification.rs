use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{clean, ListQuery, DATE_SORTS};
use crate::database::models::notification::NotificationKind;
use crate::database::models::user::{AgentInfo, BuilderInfo, User};
use crate::database::models::verification::{RequestedRole, VerificationRequest, VerificationStatus};
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::services::notifications::notify;
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVerificationRequest {
    pub requested_role: RequestedRole,
    #[validate(length(max = 50))]
    pub license_number: Option<String>,
    #[validate(length(max = 200))]
    pub agency_name: Option<String>,
    #[validate(range(max = 60, message = "Experience must be at most 60 years"))]
    pub experience_years: Option<u32>,
    #[validate(length(max = 200))]
    pub company_name: Option<String>,
    #[validate(length(max = 50))]
    pub rera_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewVerificationRequest {
    pub status: VerificationStatus,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSearch {
    pub status: Option<VerificationStatus>,
    pub requested_role: Option<RequestedRole>,
}

fn required(value: Option<String>, field: &str, label: &str) -> Result<String, ApiError> {
    clean(value).ok_or_else(|| ApiError::invalid_field(field, format!("{} is required", label)))
}

/// POST /api/verification - ask to become an agent or builder
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<SubmitVerificationRequest>,
) -> ApiResult<VerificationRequest> {
    let target = Role::from(body.requested_role);
    if user.role == target {
        return Err(ApiError::conflict(format!("You already have the {} role", target)));
    }

    let requests = state.collection::<VerificationRequest>();
    let pending = requests
        .exists(
            Filter::new()
                .eq("userId", user.user_id)
                .eq("status", VerificationStatus::Pending),
        )
        .await?;
    if pending {
        return Err(ApiError::conflict("You already have a pending verification request"));
    }

    let now = Utc::now();
    let mut request = VerificationRequest {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        requested_role: body.requested_role,
        license_number: None,
        agency_name: None,
        experience_years: None,
        company_name: None,
        rera_number: None,
        status: VerificationStatus::Pending,
        reason: None,
        reviewed_by: None,
        reviewed_at: None,
        created_at: now,
        updated_at: now,
    };
    match body.requested_role {
        RequestedRole::Agent => {
            request.license_number = Some(required(body.license_number, "licenseNumber", "License number")?);
            request.agency_name = Some(required(body.agency_name, "agencyName", "Agency name")?);
            request.experience_years = body.experience_years;
        }
        RequestedRole::Builder => {
            request.company_name = Some(required(body.company_name, "companyName", "Company name")?);
            request.rera_number = Some(required(body.rera_number, "reraNumber", "RERA number")?);
        }
    }
    requests.insert(&request).await?;

    tracing::info!(request_id = %request.id, user_id = %user.user_id, role = %target, "verification requested");
    Ok(ApiResponse::created(request).message("Verification request submitted"))
}

/// GET /api/verification/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<VerificationRequest> {
    let request = state
        .collection::<VerificationRequest>()
        .find_one(
            Filter::new()
                .eq("userId", user.user_id)
                .order_by("createdAt", SortDirection::Desc),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("No verification request found"))?;
    Ok(ApiResponse::success(request))
}

/// GET /api/verification - admin review queue
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(search): Query<VerificationSearch>,
) -> ApiResult<Page<VerificationRequest>> {
    let mut filter = Filter::new();
    if let Some(status) = search.status {
        filter = filter.eq("status", status);
    }
    if let Some(role) = search.requested_role {
        filter = filter.eq("requestedRole", role);
    }
    let page = state
        .collection::<VerificationRequest>()
        .page(filter.with_order(query.order(DATE_SORTS)?), query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// PATCH /api/verification/:id - admin approves or rejects
pub async fn review(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ReviewVerificationRequest>,
) -> ApiResult<VerificationRequest> {
    let requests = state.collection::<VerificationRequest>();
    let mut request = requests.get_404(id).await?;
    if request.status != VerificationStatus::Pending {
        return Err(ApiError::conflict("Only pending verification requests can be reviewed"));
    }
    if body.status == VerificationStatus::Pending {
        return Err(ApiError::invalid_field("status", "Status must be approved or rejected"));
    }

    let now = Utc::now();
    let users = state.collection::<User>();
    let mut user = users.get_404(request.user_id).await?;

    request.status = body.status;
    request.reason = clean(body.reason);
    request.reviewed_by = Some(admin.user_id);
    request.reviewed_at = Some(now);
    request.updated_at = now;

    let (title, message) = if body.status == VerificationStatus::Approved {
        user.role = request.requested_role.into();
        match request.requested_role {
            RequestedRole::Agent => {
                user.agent_info = Some(AgentInfo {
                    license_number: request.license_number.clone().unwrap_or_default(),
                    agency_name: request.agency_name.clone().unwrap_or_default(),
                    experience_years: request.experience_years,
                    verified_at: now,
                });
            }
            RequestedRole::Builder => {
                user.builder_info = Some(BuilderInfo {
                    company_name: request.company_name.clone().unwrap_or_default(),
                    rera_number: request.rera_number.clone().unwrap_or_default(),
                    verified_at: now,
                });
            }
        }
        user.updated_at = now;
        users.save(&user).await?;
        ("Verification approved", format!("You are now verified as {}", user.role))
    } else {
        let reason = request.reason.clone().unwrap_or_else(|| "no reason given".to_string());
        ("Verification rejected", format!("Your verification request was rejected: {}", reason))
    };
    requests.save(&request).await?;

    notify(
        &state,
        user.id,
        NotificationKind::Verification,
        title,
        message,
        Some("/verification".to_string()),
    )
    .await;

    tracing::info!(request_id = %id, status = ?request.status, admin_id = %admin.user_id, "verification reviewed");
    Ok(ApiResponse::success(request).message("Verification request reviewed"))
}
