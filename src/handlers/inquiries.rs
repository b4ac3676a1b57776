use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{clean, ensure_owner, ListQuery, DATE_SORTS};
use crate::database::models::inquiry::{Inquiry, InquiryStatus};
use crate::database::models::notification::NotificationKind;
use crate::database::models::property::Property;
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::services::notifications::notify;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInquiryRequest {
    #[validate(length(min = 5, max = 2000, message = "Message must be between 5 and 2000 characters"))]
    pub message: String,
    #[validate(length(min = 7, max = 20, message = "Phone number must be between 7 and 20 characters"))]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InquiryStatusRequest {
    pub status: InquiryStatus,
}

/// POST /api/properties/:id/inquiries - tenant asks about a listing
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<CreateInquiryRequest>,
) -> ApiResult<Inquiry> {
    let property = state.collection::<Property>().get_404(property_id).await?;
    if property.is_owned_by(user.user_id) {
        return Err(ApiError::bad_request("You cannot inquire on your own property"));
    }

    let now = Utc::now();
    let inquiry = Inquiry {
        id: Uuid::new_v4(),
        property_id,
        property_owner_id: property.owner_id,
        user_id: user.user_id,
        message: body.message.trim().to_string(),
        contact_phone: clean(body.contact_phone),
        status: InquiryStatus::New,
        created_at: now,
        updated_at: now,
    };
    state.collection::<Inquiry>().insert(&inquiry).await?;

    notify(
        &state,
        property.owner_id,
        NotificationKind::Inquiry,
        "New inquiry",
        format!("Someone asked about \"{}\"", property.title),
        Some(format!("/properties/{}", property.id)),
    )
    .await;

    Ok(ApiResponse::created(inquiry).message("Inquiry sent"))
}

/// GET /api/inquiries - inquiries the caller has sent
pub async fn list_sent(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<Inquiry>> {
    let filter = Filter::new()
        .eq("userId", user.user_id)
        .with_order(query.order(DATE_SORTS)?);
    let page = state
        .collection::<Inquiry>()
        .page(filter, query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/properties/:id/inquiries - inquiries received on an owned listing
pub async fn list_for_property(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<Inquiry>> {
    let property = state.collection::<Property>().get_404(property_id).await?;
    ensure_owner(property.owner_id, &user, "property")?;

    let filter = Filter::new()
        .eq("propertyId", property_id)
        .with_order(query.order(DATE_SORTS)?);
    let page = state
        .collection::<Inquiry>()
        .page(filter, query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// PATCH /api/inquiries/:id/status - property owner follows up
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<InquiryStatusRequest>,
) -> ApiResult<Inquiry> {
    let inquiries = state.collection::<Inquiry>();
    let mut inquiry = inquiries.get_404(id).await?;
    ensure_owner(inquiry.property_owner_id, &user, "inquiry")?;

    if !inquiry.status.can_transition_to(body.status) {
        return Err(ApiError::conflict(format!(
            "Cannot move inquiry from {} to {}",
            inquiry.status.as_str(),
            body.status.as_str()
        )));
    }

    inquiry.status = body.status;
    inquiry.updated_at = Utc::now();
    inquiries.save(&inquiry).await?;
    Ok(ApiResponse::success(inquiry).message("Inquiry updated"))
}
