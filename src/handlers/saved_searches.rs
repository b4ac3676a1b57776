use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{ensure_owner, ListQuery, DATE_SORTS};
use crate::database::models::property::{Property, PropertySearch};
use crate::database::models::saved_search::SavedSearch;
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

/// Results of a saved search are always newest first unless asked otherwise.
const RESULT_SORTS: &[SortSpec] = &[
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
    SortSpec { key: "price_asc", fields: &[("price", SortDirection::Asc)] },
    SortSpec { key: "price_desc", fields: &[("price", SortDirection::Desc)] },
];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSavedSearchRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    pub criteria: PropertySearch,
    #[serde(default)]
    pub alerts_enabled: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSavedSearchRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub criteria: Option<PropertySearch>,
    pub alerts_enabled: Option<bool>,
}

fn check_criteria(criteria: &PropertySearch) -> Result<(), ApiError> {
    if let (Some(min), Some(max)) = (criteria.min_price, criteria.max_price) {
        if min > max {
            return Err(ApiError::invalid_field(
                "criteria.maxPrice",
                "Maximum price cannot be below minimum price",
            ));
        }
    }
    Ok(())
}

async fn load_owned(state: &AppState, user: &AuthUser, id: Uuid) -> Result<SavedSearch, ApiError> {
    let search = state.collection::<SavedSearch>().get_404(id).await?;
    ensure_owner(search.user_id, user, "saved search")?;
    Ok(search)
}

/// GET /api/saved-searches
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<SavedSearch>> {
    let filter = Filter::new()
        .eq("userId", user.user_id)
        .with_order(query.order(DATE_SORTS)?);
    let page = state
        .collection::<SavedSearch>()
        .page(filter, query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/saved-searches
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateSavedSearchRequest>,
) -> ApiResult<SavedSearch> {
    check_criteria(&body.criteria)?;
    let now = Utc::now();
    let search = SavedSearch {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        name: body.name.trim().to_string(),
        criteria: body.criteria,
        alerts_enabled: body.alerts_enabled,
        created_at: now,
        updated_at: now,
    };
    state.collection::<SavedSearch>().insert(&search).await?;
    Ok(ApiResponse::created(search).message("Search saved"))
}

/// GET /api/saved-searches/:id
pub async fn show(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<SavedSearch> {
    Ok(ApiResponse::success(load_owned(&state, &user, id).await?))
}

/// PATCH /api/saved-searches/:id
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateSavedSearchRequest>,
) -> ApiResult<SavedSearch> {
    let mut search = load_owned(&state, &user, id).await?;
    if let Some(name) = body.name {
        search.name = name.trim().to_string();
    }
    if let Some(criteria) = body.criteria {
        check_criteria(&criteria)?;
        search.criteria = criteria;
    }
    if let Some(alerts_enabled) = body.alerts_enabled {
        search.alerts_enabled = alerts_enabled;
    }
    search.updated_at = Utc::now();
    state.collection::<SavedSearch>().save(&search).await?;
    Ok(ApiResponse::success(search).message("Search updated"))
}

/// DELETE /api/saved-searches/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<()> {
    load_owned(&state, &user, id).await?;
    state.collection::<SavedSearch>().delete(id).await?;
    Ok(ApiResponse::success(()).message("Search deleted"))
}

/// GET /api/saved-searches/:id/results - run the stored criteria
pub async fn results(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<Property>> {
    let search = load_owned(&state, &user, id).await?;
    let filter = search.criteria.to_filter().with_order(query.order(RESULT_SORTS)?);
    let properties = state.collection::<Property>();
    Property::expire_stale(&properties, Utc::now()).await?;
    let page = properties.page(filter, query.page_request(&state.config.api)).await?;
    Ok(ApiResponse::success(page))
}
