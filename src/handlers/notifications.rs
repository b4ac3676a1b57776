use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ListQuery, DATE_SORTS};
use crate::database::models::notification::Notification;
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationSearch {
    pub unread: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: usize,
}

async fn load_owned(state: &AppState, user: &AuthUser, id: Uuid) -> Result<Notification, ApiError> {
    let notification = state.collection::<Notification>().get_404(id).await?;
    // Someone else's notification is reported as missing
    if notification.user_id != user.user_id {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(notification)
}

/// GET /api/notifications - `?unread=true` for unread only
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
    Query(search): Query<NotificationSearch>,
) -> ApiResult<Page<Notification>> {
    let mut filter = Filter::new().eq("userId", user.user_id);
    if search.unread == Some(true) {
        filter = filter.eq("read", false);
    }
    let page = state
        .collection::<Notification>()
        .page(filter.with_order(query.order(DATE_SORTS)?), query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// PATCH /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Notification> {
    let mut notification = load_owned(&state, &user, id).await?;
    if !notification.read {
        notification.read = true;
        state.collection::<Notification>().save(&notification).await?;
    }
    Ok(ApiResponse::success(notification))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(State(state): State<AppState>, user: AuthUser) -> ApiResult<MarkedRead> {
    let notifications = state.collection::<Notification>();
    let unread = notifications
        .find(&Filter::new().eq("userId", user.user_id).eq("read", false))
        .await?;
    for mut notification in unread.iter().cloned() {
        notification.read = true;
        notifications.save(&notification).await?;
    }
    Ok(ApiResponse::success(MarkedRead { updated: unread.len() }).message("All notifications marked as read"))
}

/// DELETE /api/notifications/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<()> {
    load_owned(&state, &user, id).await?;
    state.collection::<Notification>().delete(id).await?;
    Ok(ApiResponse::success(()).message("Notification deleted"))
}
