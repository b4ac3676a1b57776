use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{ListQuery, DATE_SORTS};
use crate::database::models::favorite::Favorite;
use crate::database::models::property::Property;
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: Uuid,
    pub property_id: Uuid,
    pub created_at: chrono::DateTime<Utc>,
    pub property: Option<Property>,
}

fn key(user_id: Uuid, property_id: Uuid) -> Filter {
    Filter::new().eq("userId", user_id).eq("propertyId", property_id)
}

/// POST /api/properties/:id/favorite
pub async fn add(State(state): State<AppState>, user: AuthUser, Path(property_id): Path<Uuid>) -> ApiResult<Favorite> {
    state.collection::<Property>().get_404(property_id).await?;

    let favorites = state.collection::<Favorite>();
    if favorites.exists(key(user.user_id, property_id)).await? {
        return Err(ApiError::conflict("Property is already in your favorites"));
    }

    let favorite = Favorite {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        property_id,
        created_at: Utc::now(),
    };
    favorites.insert(&favorite).await?;
    Ok(ApiResponse::created(favorite).message("Added to favorites"))
}

/// DELETE /api/properties/:id/favorite
pub async fn remove(State(state): State<AppState>, user: AuthUser, Path(property_id): Path<Uuid>) -> ApiResult<()> {
    let favorites = state.collection::<Favorite>();
    let favorite = favorites
        .find_one(key(user.user_id, property_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Property is not in your favorites"))?;
    favorites.delete(favorite.id).await?;
    Ok(ApiResponse::success(()).message("Removed from favorites"))
}

/// GET /api/favorites - saved properties, newest first
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<FavoriteEntry>> {
    let filter = Filter::new()
        .eq("userId", user.user_id)
        .with_order(query.order(DATE_SORTS)?);
    let page = state
        .collection::<Favorite>()
        .page(filter, query.page_request(&state.config.api))
        .await?;

    let properties = state.collection::<Property>();
    let mut items = Vec::with_capacity(page.items.len());
    for favorite in &page.items {
        items.push(FavoriteEntry {
            id: favorite.id,
            property_id: favorite.property_id,
            created_at: favorite.created_at,
            property: properties.get(favorite.property_id).await?,
        });
    }

    Ok(ApiResponse::success(Page {
        items,
        page: page.page,
        limit: page.limit,
        total: page.total,
        total_pages: page.total_pages,
    }))
}
