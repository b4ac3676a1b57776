use axum::extract::{Path, Query, State};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{clean, ensure_owner, ListQuery};
use crate::database::models::commercial::{normalize_spv_id, CommercialProperty, CommercialType};
use crate::database::models::property::PropertyStatus;
use crate::database::models::Address;
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

const SORTS: &[SortSpec] = &[
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
    SortSpec { key: "oldest", fields: &[("createdAt", SortDirection::Asc)] },
    SortSpec { key: "price_asc", fields: &[("pricePerShare", SortDirection::Asc)] },
    SortSpec { key: "price_desc", fields: &[("pricePerShare", SortDirection::Desc)] },
    SortSpec { key: "yield", fields: &[("expectedYield", SortDirection::Desc)] },
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommercialSearch {
    pub city: Option<String>,
    pub commercial_type: Option<CommercialType>,
    pub status: Option<PropertyStatus>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommercialRequest {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: String,
    #[validate(nested)]
    pub address: Address,
    pub commercial_type: CommercialType,
    #[validate(length(min = 3, max = 50, message = "SPV id must be between 3 and 50 characters"))]
    pub spv_id: String,
    #[validate(range(min = 1, message = "Total shares must be at least 1"))]
    pub total_shares: u32,
    pub available_shares: Option<u32>,
    pub price_per_share: Decimal,
    pub expected_yield: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommercialRequest {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: Option<String>,
    #[validate(nested)]
    pub address: Option<Address>,
    pub commercial_type: Option<CommercialType>,
    #[validate(range(min = 1, message = "Total shares must be at least 1"))]
    pub total_shares: Option<u32>,
    pub available_shares: Option<u32>,
    pub price_per_share: Option<Decimal>,
    pub expected_yield: Option<Decimal>,
    pub status: Option<PropertyStatus>,
}

fn check_invariants(asset: &CommercialProperty) -> Result<(), ApiError> {
    if asset.available_shares > asset.total_shares {
        return Err(ApiError::invalid_field(
            "availableShares",
            "Available shares cannot exceed total shares",
        ));
    }
    if asset.price_per_share <= Decimal::ZERO {
        return Err(ApiError::invalid_field("pricePerShare", "Price per share must be greater than zero"));
    }
    if asset.expected_yield.map_or(false, |y| y.is_sign_negative()) {
        return Err(ApiError::invalid_field("expectedYield", "Expected yield cannot be negative"));
    }
    Ok(())
}

/// GET /api/commercial
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(search): Query<CommercialSearch>,
) -> ApiResult<Page<CommercialProperty>> {
    let mut filter = Filter::new().eq("status", search.status.unwrap_or(PropertyStatus::Active));
    if let Some(city) = clean(search.city) {
        filter = filter.contains("address.city", &city);
    }
    if let Some(commercial_type) = search.commercial_type {
        filter = filter.eq("commercialType", commercial_type);
    }

    let page = state
        .collection::<CommercialProperty>()
        .page(filter.with_order(query.order(SORTS)?), query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/commercial/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<CommercialProperty> {
    Ok(ApiResponse::success(
        state.collection::<CommercialProperty>().get_404(id).await?,
    ))
}

/// POST /api/commercial - landlords, builders and agents
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateCommercialRequest>,
) -> ApiResult<CommercialProperty> {
    let now = Utc::now();
    let asset = CommercialProperty {
        id: Uuid::new_v4(),
        owner_id: user.user_id,
        title: body.title.trim().to_string(),
        description: body.description,
        address: body.address,
        commercial_type: body.commercial_type,
        spv_id: normalize_spv_id(&body.spv_id),
        total_shares: body.total_shares,
        available_shares: body.available_shares.unwrap_or(body.total_shares),
        price_per_share: body.price_per_share,
        expected_yield: body.expected_yield,
        status: PropertyStatus::Active,
        created_at: now,
        updated_at: now,
    };
    check_invariants(&asset)?;

    let assets = state.collection::<CommercialProperty>();
    if assets.exists(Filter::new().eq("spvId", &asset.spv_id)).await? {
        return Err(ApiError::conflict("A commercial property with this SPV id already exists"));
    }
    assets.insert(&asset).await?;

    tracing::info!(commercial_id = %asset.id, spv_id = %asset.spv_id, "commercial property created");
    Ok(ApiResponse::created(asset).message("Commercial property created"))
}

/// PATCH /api/commercial/:id
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateCommercialRequest>,
) -> ApiResult<CommercialProperty> {
    let assets = state.collection::<CommercialProperty>();
    let mut asset = assets.get_404(id).await?;
    ensure_owner(asset.owner_id, &user, "commercial property")?;

    if let Some(title) = body.title {
        asset.title = title.trim().to_string();
    }
    if let Some(description) = body.description {
        asset.description = description;
    }
    if let Some(address) = body.address {
        asset.address = address;
    }
    if let Some(commercial_type) = body.commercial_type {
        asset.commercial_type = commercial_type;
    }
    if let Some(total_shares) = body.total_shares {
        asset.total_shares = total_shares;
    }
    if let Some(available_shares) = body.available_shares {
        asset.available_shares = available_shares;
    }
    if let Some(price_per_share) = body.price_per_share {
        asset.price_per_share = price_per_share;
    }
    if body.expected_yield.is_some() {
        asset.expected_yield = body.expected_yield;
    }
    if let Some(status) = body.status {
        asset.status = status;
    }
    check_invariants(&asset)?;

    asset.updated_at = Utc::now();
    assets.save(&asset).await?;
    Ok(ApiResponse::success(asset).message("Commercial property updated"))
}

/// DELETE /api/commercial/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<()> {
    let assets = state.collection::<CommercialProperty>();
    let asset = assets.get_404(id).await?;
    ensure_owner(asset.owner_id, &user, "commercial property")?;

    assets.delete(id).await?;
    Ok(ApiResponse::success(()).message("Commercial property deleted"))
}
