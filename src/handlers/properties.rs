use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{clean, ensure_owner, ListQuery};
use crate::database::models::property::{ListingType, Property, PropertySearch, PropertyStatus, PropertyType};
use crate::database::models::user::{ContactCard, User};
use crate::database::models::{Address, GeoPoint};
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::services::insights::{price_insight, PropertyInsight};
use crate::state::AppState;

const SORTS: &[SortSpec] = &[
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
    SortSpec { key: "oldest", fields: &[("createdAt", SortDirection::Asc)] },
    SortSpec { key: "price_asc", fields: &[("price", SortDirection::Asc)] },
    SortSpec { key: "price_desc", fields: &[("price", SortDirection::Desc)] },
    SortSpec { key: "popular", fields: &[("views", SortDirection::Desc), ("createdAt", SortDirection::Desc)] },
];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: Decimal,
    #[validate(range(min = 1, message = "Area must be positive"))]
    pub area_sqft: Option<u32>,
    #[validate(range(max = 50, message = "Bedrooms must be at most 50"))]
    pub bedrooms: Option<u32>,
    #[validate(range(max = 50, message = "Bathrooms must be at most 50"))]
    pub bathrooms: Option<u32>,
    #[validate(nested)]
    pub address: Address,
    #[validate(nested)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 30, message = "At most 30 images per listing"))]
    pub images: Vec<String>,
    #[validate(url(message = "Virtual tour must be a valid URL"))]
    pub virtual_tour_url: Option<String>,
    pub agent_id: Option<Uuid>,
    /// Only `active` or `draft` at creation
    pub status: Option<PropertyStatus>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub price: Option<Decimal>,
    #[validate(range(min = 1, message = "Area must be positive"))]
    pub area_sqft: Option<u32>,
    #[validate(range(max = 50, message = "Bedrooms must be at most 50"))]
    pub bedrooms: Option<u32>,
    #[validate(range(max = 50, message = "Bathrooms must be at most 50"))]
    pub bathrooms: Option<u32>,
    #[validate(nested)]
    pub address: Option<Address>,
    #[validate(nested)]
    pub location: Option<GeoPoint>,
    pub amenities: Option<Vec<String>>,
    #[validate(length(max = 30, message = "At most 30 images per listing"))]
    pub images: Option<Vec<String>>,
    #[validate(url(message = "Virtual tour must be a valid URL"))]
    pub virtual_tour_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    pub status: PropertyStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualTour {
    pub property_id: Uuid,
    pub virtual_tour_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyContact {
    pub property_id: Uuid,
    pub owner: ContactCard,
    pub agent: Option<ContactCard>,
}

fn ensure_positive_price(price: Decimal) -> Result<(), ApiError> {
    if price <= Decimal::ZERO {
        return Err(ApiError::invalid_field("price", "Price must be greater than zero"));
    }
    Ok(())
}

/// Read-side view: active listings past `expiresAt` report as expired.
fn present(mut property: Property, now: DateTime<Utc>) -> Property {
    property.status = property.derive_status(now);
    property
}

/// GET /api/properties - public search
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(search): Query<PropertySearch>,
) -> ApiResult<Page<Property>> {
    let filter = search.to_filter().with_order(query.order(SORTS)?);
    let now = Utc::now();
    let properties = state.collection::<Property>();
    Property::expire_stale(&properties, now).await?;
    let page = properties.page(filter, query.page_request(&state.config.api)).await?;
    Ok(ApiResponse::success(page.map(|p| present(p, now))))
}

/// GET /api/properties/mine - listings owned by the caller, any status
pub async fn mine(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<Property>> {
    let filter = Filter::new()
        .eq("ownerId", user.user_id)
        .with_order(query.order(SORTS)?);
    let page = state
        .collection::<Property>()
        .page(filter, query.page_request(&state.config.api))
        .await?;
    let now = Utc::now();
    Ok(ApiResponse::success(page.map(|p| present(p, now))))
}

/// GET /api/properties/:id - show a listing and count the view
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Property> {
    let properties = state.collection::<Property>();
    let mut property = properties.get_404(id).await?;
    let now = Utc::now();

    property.views += 1;
    property.status = property.derive_status(now);
    properties.save(&property).await?;

    Ok(ApiResponse::success(property))
}

/// POST /api/properties - create a listing (metered by `create_listing`)
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreatePropertyRequest>,
) -> ApiResult<Property> {
    ensure_positive_price(body.price)?;
    let status = body.status.unwrap_or(PropertyStatus::Active);
    if !matches!(status, PropertyStatus::Active | PropertyStatus::Draft) {
        return Err(ApiError::invalid_field("status", "New listings must be active or draft"));
    }

    if let Some(agent_id) = body.agent_id {
        let agent = state.collection::<User>().get(agent_id).await?;
        if !agent.map_or(false, |a| a.role == crate::types::Role::Agent) {
            return Err(ApiError::invalid_field("agentId", "Agent not found"));
        }
    }

    let now = Utc::now();
    let mut property = Property {
        id: Uuid::new_v4(),
        owner_id: user.user_id,
        agent_id: body.agent_id,
        title: body.title.trim().to_string(),
        description: body.description,
        property_type: body.property_type,
        listing_type: body.listing_type,
        price: body.price,
        area_sqft: body.area_sqft,
        bedrooms: body.bedrooms,
        bathrooms: body.bathrooms,
        address: body.address,
        location: body.location,
        amenities: body.amenities,
        images: body.images,
        virtual_tour_url: clean(body.virtual_tour_url),
        status,
        views: 0,
        expires_at: body.expires_at,
        created_at: now,
        updated_at: now,
    };
    property.status = property.derive_status(now);
    state.collection::<Property>().insert(&property).await?;

    tracing::info!(property_id = %property.id, owner_id = %user.user_id, "property listed");
    Ok(ApiResponse::created(property).message("Property created"))
}

/// PATCH /api/properties/:id - owner edits
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdatePropertyRequest>,
) -> ApiResult<Property> {
    let properties = state.collection::<Property>();
    let mut property = properties.get_404(id).await?;
    ensure_owner(property.owner_id, &user, "property")?;

    if let Some(price) = body.price {
        ensure_positive_price(price)?;
        property.price = price;
    }
    if let Some(title) = body.title {
        property.title = title.trim().to_string();
    }
    if let Some(description) = body.description {
        property.description = description;
    }
    if let Some(property_type) = body.property_type {
        property.property_type = property_type;
    }
    if let Some(listing_type) = body.listing_type {
        property.listing_type = listing_type;
    }
    if body.area_sqft.is_some() {
        property.area_sqft = body.area_sqft;
    }
    if body.bedrooms.is_some() {
        property.bedrooms = body.bedrooms;
    }
    if body.bathrooms.is_some() {
        property.bathrooms = body.bathrooms;
    }
    if let Some(address) = body.address {
        property.address = address;
    }
    if body.location.is_some() {
        property.location = body.location;
    }
    if let Some(amenities) = body.amenities {
        property.amenities = amenities;
    }
    if let Some(images) = body.images {
        property.images = images;
    }
    if body.virtual_tour_url.is_some() {
        property.virtual_tour_url = clean(body.virtual_tour_url);
    }
    if body.expires_at.is_some() {
        property.expires_at = body.expires_at;
    }

    let now = Utc::now();
    property.status = property.derive_status(now);
    property.updated_at = now;
    properties.save(&property).await?;

    Ok(ApiResponse::success(property).message("Property updated"))
}

/// PATCH /api/properties/:id/status - owner moves a listing through its lifecycle
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<StatusRequest>,
) -> ApiResult<Property> {
    let properties = state.collection::<Property>();
    let mut property = properties.get_404(id).await?;
    ensure_owner(property.owner_id, &user, "property")?;

    let now = Utc::now();
    property.status = body.status;
    if body.status == PropertyStatus::Active {
        // Reactivating past the expiry date clears it
        if property.expires_at.map_or(false, |at| at <= now) {
            property.expires_at = None;
        }
    }
    property.updated_at = now;
    properties.save(&property).await?;

    Ok(ApiResponse::success(property).message("Status updated"))
}

/// DELETE /api/properties/:id - retire the listing; documents are kept
pub async fn retire(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<Property> {
    let properties = state.collection::<Property>();
    let mut property = properties.get_404(id).await?;
    ensure_owner(property.owner_id, &user, "property")?;

    property.status = PropertyStatus::Expired;
    property.updated_at = Utc::now();
    properties.save(&property).await?;

    tracing::info!(property_id = %id, "property retired");
    Ok(ApiResponse::success(property).message("Property removed"))
}

/// GET /api/properties/:id/contact - owner contact details (metered by `view_contact`)
pub async fn contact(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<PropertyContact> {
    let property = state.collection::<Property>().get_404(id).await?;
    let users = state.collection::<User>();
    let owner = users.get_404(property.owner_id).await?;
    let agent = match property.agent_id {
        Some(agent_id) => users.get(agent_id).await?,
        None => None,
    };

    Ok(ApiResponse::success(PropertyContact {
        property_id: property.id,
        owner: ContactCard::from(&owner),
        agent: agent.as_ref().map(ContactCard::from),
    }))
}

/// GET /api/properties/:id/virtual-tour - STANDARD plan and above
pub async fn virtual_tour(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<VirtualTour> {
    let property = state.collection::<Property>().get_404(id).await?;
    let url = property
        .virtual_tour_url
        .ok_or_else(|| ApiError::not_found("This property has no virtual tour"))?;
    Ok(ApiResponse::success(VirtualTour {
        property_id: property.id,
        virtual_tour_url: url,
    }))
}

/// GET /api/properties/:id/insights - PREMIUM price analysis against the city
pub async fn insights(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<PropertyInsight> {
    let properties = state.collection::<Property>();
    let property = properties.get_404(id).await?;
    Property::expire_stale(&properties, Utc::now()).await?;
    let comparables = properties
        .find(
            &Filter::new()
                .eq("status", PropertyStatus::Active)
                .eq("address.city", &property.address.city)
                .eq("propertyType", property.property_type),
        )
        .await?;
    Ok(ApiResponse::success(price_insight(&property, &comparables)))
}
