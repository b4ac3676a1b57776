use axum::extract::{Path, Query, State};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{clean, ListQuery, DATE_SORTS};
use crate::database::models::kyc::{KycRequest, KycStatus, OtpCheck};
use crate::database::models::notification::NotificationKind;
use crate::database::models::user::User;
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::services::mailer::{kyc_otp_email, MailError};
use crate::services::notifications::notify;
use crate::services::otp::{generate_otp, hash_otp, OTP_DIGITS};
use crate::state::AppState;

static PAN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("valid PAN pattern"));

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitKycRequest {
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: String,
    pub pan_number: String,
    #[validate(url(message = "Document must be a valid URL"))]
    pub document_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewKycRequest {
    pub status: KycStatus,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, message = "OTP is required"))]
    pub otp: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct KycSearch {
    pub status: Option<KycStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpIssued {
    pub request_id: Uuid,
    pub otp_expires_at: chrono::DateTime<Utc>,
}

pub fn normalize_pan(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn is_valid_pan(pan: &str) -> bool {
    PAN_PATTERN.is_match(pan)
}

/// Store a fresh OTP hash on the request and mail the code to its owner.
async fn issue_otp(state: &AppState, request: &mut KycRequest, user: &User) -> Result<(), MailError> {
    let ttl = state.config.kyc.otp_ttl_minutes;
    let otp = generate_otp();
    let now = Utc::now();
    request.otp_hash = Some(hash_otp(&otp));
    request.otp_expires_at = Some(now + Duration::minutes(ttl));
    request.updated_at = now;

    let receipt = state
        .mailer
        .send(kyc_otp_email(&user.email, &user.name, &otp, ttl))
        .await?;
    tracing::info!(kyc_id = %request.id, message_id = %receipt.message_id, "KYC OTP sent");
    Ok(())
}

/// Latest request of the user in the given status.
async fn latest_request(state: &AppState, user_id: Uuid, status: Option<KycStatus>) -> Result<Option<KycRequest>, ApiError> {
    let mut filter = Filter::new().eq("userId", user_id);
    if let Some(status) = status {
        filter = filter.eq("status", status);
    }
    Ok(state
        .collection::<KycRequest>()
        .find_one(filter.order_by("createdAt", SortDirection::Desc))
        .await?)
}

/// POST /api/kyc - submit identity documents
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<SubmitKycRequest>,
) -> ApiResult<KycRequest> {
    let pan_number = normalize_pan(&body.pan_number);
    if !is_valid_pan(&pan_number) {
        return Err(ApiError::invalid_field("panNumber", "Invalid PAN number format"));
    }

    let requests = state.collection::<KycRequest>();
    let open = requests
        .exists(
            Filter::new()
                .eq("userId", user.user_id)
                .is_in("status", &[KycStatus::Pending, KycStatus::Accepted]),
        )
        .await?;
    if open {
        return Err(ApiError::conflict("You already have a pending or accepted KYC request"));
    }

    let now = Utc::now();
    let request = KycRequest {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        full_name: body.full_name.trim().to_string(),
        pan_number,
        document_url: body.document_url,
        status: KycStatus::Pending,
        rejection_reason: None,
        otp_hash: None,
        otp_expires_at: None,
        otp_verified: false,
        reviewed_by: None,
        reviewed_at: None,
        created_at: now,
        updated_at: now,
    };
    requests.insert(&request).await?;

    tracing::info!(kyc_id = %request.id, user_id = %user.user_id, "KYC submitted");
    Ok(ApiResponse::created(request).message("KYC submitted for review"))
}

/// GET /api/kyc/me - most recent request
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<KycRequest> {
    let request = latest_request(&state, user.user_id, None)
        .await?
        .ok_or_else(|| ApiError::not_found("No KYC request found"))?;
    Ok(ApiResponse::success(request.redacted()))
}

/// GET /api/kyc - admin review queue
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(search): Query<KycSearch>,
) -> ApiResult<Page<KycRequest>> {
    let mut filter = Filter::new();
    if let Some(status) = search.status {
        filter = filter.eq("status", status);
    }
    let page = state
        .collection::<KycRequest>()
        .page(filter.with_order(query.order(DATE_SORTS)?), query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page.map(KycRequest::redacted)))
}

/// PATCH /api/kyc/:id - admin accepts (issuing an OTP) or rejects
pub async fn review(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ReviewKycRequest>,
) -> ApiResult<KycRequest> {
    let requests = state.collection::<KycRequest>();
    let mut request = requests.get_404(id).await?;
    if request.status != KycStatus::Pending {
        return Err(ApiError::conflict("Only pending KYC requests can be reviewed"));
    }

    let now = Utc::now();
    request.reviewed_by = Some(admin.user_id);
    request.reviewed_at = Some(now);
    request.updated_at = now;

    let user = state.collection::<User>().get_404(request.user_id).await?;
    match body.status {
        KycStatus::Pending => {
            return Err(ApiError::invalid_field("status", "Status must be accepted or rejected"));
        }
        KycStatus::Rejected => {
            let reason = clean(body.reason)
                .ok_or_else(|| ApiError::invalid_field("reason", "A rejection reason is required"))?;
            request.status = KycStatus::Rejected;
            request.rejection_reason = Some(reason.clone());
            requests.save(&request).await?;
            notify(
                &state,
                user.id,
                NotificationKind::Kyc,
                "KYC rejected",
                format!("Your KYC request was rejected: {}", reason),
                Some("/kyc".to_string()),
            )
            .await;
        }
        KycStatus::Accepted => {
            request.status = KycStatus::Accepted;
            // The request is accepted even if mail delivery fails; the user can resend
            if let Err(e) = issue_otp(&state, &mut request, &user).await {
                tracing::error!(kyc_id = %request.id, "failed to send KYC OTP: {}", e);
            }
            requests.save(&request).await?;
            notify(
                &state,
                user.id,
                NotificationKind::Kyc,
                "KYC accepted",
                format!("Check your email for a {}-digit code to complete verification", OTP_DIGITS),
                Some("/kyc".to_string()),
            )
            .await;
        }
    }

    tracing::info!(kyc_id = %id, status = ?request.status, admin_id = %admin.user_id, "KYC reviewed");
    Ok(ApiResponse::success(request.redacted()).message("KYC request reviewed"))
}

/// POST /api/kyc/verify-otp - finish KYC with the emailed code
pub async fn verify_otp(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<VerifyOtpRequest>,
) -> ApiResult<KycRequest> {
    let mut request = latest_request(&state, user.user_id, Some(KycStatus::Accepted))
        .await?
        .ok_or_else(|| ApiError::not_found("No accepted KYC request found"))?;

    let now = Utc::now();
    match request.check_otp(&hash_otp(&body.otp), now) {
        OtpCheck::Valid => {}
        OtpCheck::Expired => return Err(ApiError::bad_request("OTP expired")),
        OtpCheck::Invalid => return Err(ApiError::bad_request("Invalid OTP")),
        OtpCheck::AlreadyVerified => return Err(ApiError::conflict("KYC is already verified")),
        OtpCheck::NotIssued => return Err(ApiError::bad_request("No OTP has been issued for this request")),
    }

    request.otp_verified = true;
    request.otp_hash = None;
    request.updated_at = now;
    state.collection::<KycRequest>().save(&request).await?;

    let users = state.collection::<User>();
    let mut record = users.get_404(user.user_id).await?;
    record.kyc_verified = true;
    record.updated_at = now;
    users.save(&record).await?;

    tracing::info!(user_id = %user.user_id, "KYC verified");
    Ok(ApiResponse::success(request).message("KYC verified"))
}

/// POST /api/kyc/resend-otp - new code for an accepted, unverified request
pub async fn resend_otp(State(state): State<AppState>, user: AuthUser) -> ApiResult<OtpIssued> {
    let mut request = latest_request(&state, user.user_id, Some(KycStatus::Accepted))
        .await?
        .ok_or_else(|| ApiError::not_found("No accepted KYC request found"))?;
    if request.otp_verified {
        return Err(ApiError::conflict("KYC is already verified"));
    }

    let record = state.collection::<User>().get_404(user.user_id).await?;
    issue_otp(&state, &mut request, &record).await?;
    state.collection::<KycRequest>().save(&request).await?;

    let otp_expires_at = request
        .otp_expires_at
        .ok_or_else(|| ApiError::internal_server_error("OTP was not issued"))?;
    Ok(ApiResponse::success(OtpIssued {
        request_id: request.id,
        otp_expires_at,
    })
    .message("A new OTP has been sent"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pan_numbers_follow_the_issued_format() {
        assert!(is_valid_pan("ABCDE1234F"));
        assert!(is_valid_pan(&normalize_pan(" abcde1234f ")));
        assert!(!is_valid_pan("ABCD1234F"));
        assert!(!is_valid_pan("ABCDE12345"));
        assert!(!is_valid_pan("ABCDE1234FG"));
    }
}
