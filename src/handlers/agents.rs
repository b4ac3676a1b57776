use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{clean, ListQuery};
use crate::database::models::property::{Property, PropertyStatus};
use crate::database::models::review::{RatingSummary, Review};
use crate::database::models::user::{User, UserProfile};
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;
use crate::types::Role;

const REVIEW_SORTS: &[SortSpec] = &[
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
    SortSpec { key: "oldest", fields: &[("createdAt", SortDirection::Asc)] },
    SortSpec { key: "rating_desc", fields: &[("rating", SortDirection::Desc), ("createdAt", SortDirection::Desc)] },
    SortSpec { key: "rating_asc", fields: &[("rating", SortDirection::Asc), ("createdAt", SortDirection::Desc)] },
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub rating: RatingSummary,
    pub active_listings: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

async fn load_agent(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    match state.collection::<User>().get(id).await? {
        Some(user) if user.role == Role::Agent => Ok(user),
        _ => Err(ApiError::not_found("Agent not found")),
    }
}

/// GET /api/agents/:id - public agent profile with rating summary
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<AgentProfile> {
    let agent = load_agent(&state, id).await?;
    let reviews = state
        .collection::<Review>()
        .find(&Filter::new().eq("agentId", id))
        .await?;
    let active_listings = state
        .collection::<Property>()
        .count(&Filter::new().eq("agentId", id).eq("status", PropertyStatus::Active))
        .await?;

    Ok(ApiResponse::success(AgentProfile {
        profile: agent.profile(),
        rating: RatingSummary::of(&reviews),
        active_listings,
    }))
}

/// GET /api/agents/:id/reviews
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<Review>> {
    load_agent(&state, id).await?;
    let filter = Filter::new()
        .eq("agentId", id)
        .with_order(query.order(REVIEW_SORTS)?);
    let page = state
        .collection::<Review>()
        .page(filter, query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/agents/:id/reviews - one review per reviewer, never of oneself
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<CreateReviewRequest>,
) -> ApiResult<Review> {
    load_agent(&state, id).await?;
    if id == user.user_id {
        return Err(ApiError::bad_request("You cannot review yourself"));
    }

    let reviews = state.collection::<Review>();
    if reviews
        .exists(Filter::new().eq("agentId", id).eq("reviewerId", user.user_id))
        .await?
    {
        return Err(ApiError::conflict("You have already reviewed this agent"));
    }

    let review = Review {
        id: Uuid::new_v4(),
        agent_id: id,
        reviewer_id: user.user_id,
        rating: body.rating,
        comment: clean(body.comment),
        created_at: Utc::now(),
    };
    reviews.insert(&review).await?;
    Ok(ApiResponse::created(review).message("Review added"))
}
