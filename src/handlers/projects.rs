use axum::extract::{Path, Query, State};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{clean, ensure_owner, ListQuery};
use crate::database::models::project::{PriceRange, Project, ProjectStatus};
use crate::database::models::{Address, GeoPoint};
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

const SORTS: &[SortSpec] = &[
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
    SortSpec { key: "oldest", fields: &[("createdAt", SortDirection::Asc)] },
    SortSpec { key: "price_asc", fields: &[("priceRange.min", SortDirection::Asc)] },
    SortSpec { key: "price_desc", fields: &[("priceRange.max", SortDirection::Desc)] },
    SortSpec { key: "possession", fields: &[("possessionDate", SortDirection::Asc)] },
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSearch {
    pub city: Option<String>,
    pub status: Option<ProjectStatus>,
    pub builder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 3, max = 200, message = "Name must be between 3 and 200 characters"))]
    pub name: String,
    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: String,
    #[validate(nested)]
    pub address: Address,
    #[validate(nested)]
    pub location: Option<GeoPoint>,
    pub status: Option<ProjectStatus>,
    #[validate(range(min = 1, message = "Total units must be at least 1"))]
    pub total_units: u32,
    pub available_units: Option<u32>,
    pub price_range: PriceRange,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub rera_id: Option<String>,
    pub launch_date: Option<NaiveDate>,
    pub possession_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 3, max = 200, message = "Name must be between 3 and 200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: Option<String>,
    #[validate(nested)]
    pub address: Option<Address>,
    #[validate(nested)]
    pub location: Option<GeoPoint>,
    pub status: Option<ProjectStatus>,
    #[validate(range(min = 1, message = "Total units must be at least 1"))]
    pub total_units: Option<u32>,
    pub available_units: Option<u32>,
    pub price_range: Option<PriceRange>,
    pub amenities: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub rera_id: Option<String>,
    pub launch_date: Option<NaiveDate>,
    pub possession_date: Option<NaiveDate>,
}

/// Cross-field invariants checked after every create or edit.
fn check_invariants(project: &Project) -> Result<(), ApiError> {
    if project.available_units > project.total_units {
        return Err(ApiError::invalid_field(
            "availableUnits",
            "Available units cannot exceed total units",
        ));
    }
    if project.price_range.min > project.price_range.max {
        return Err(ApiError::invalid_field(
            "priceRange",
            "Minimum price cannot exceed maximum price",
        ));
    }
    if project.price_range.min.is_sign_negative() {
        return Err(ApiError::invalid_field("priceRange", "Prices cannot be negative"));
    }
    if let (Some(launch), Some(possession)) = (project.launch_date, project.possession_date) {
        if possession < launch {
            return Err(ApiError::invalid_field(
                "possessionDate",
                "Possession date cannot be before launch date",
            ));
        }
    }
    Ok(())
}

/// GET /api/projects
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(search): Query<ProjectSearch>,
) -> ApiResult<Page<Project>> {
    let mut filter = Filter::new();
    if let Some(city) = clean(search.city) {
        filter = filter.contains("address.city", &city);
    }
    if let Some(status) = search.status {
        filter = filter.eq("status", status);
    }
    if let Some(builder_id) = search.builder_id {
        filter = filter.eq("builderId", builder_id);
    }

    let page = state
        .collection::<Project>()
        .page(filter.with_order(query.order(SORTS)?), query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/projects/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Project> {
    Ok(ApiResponse::success(state.collection::<Project>().get_404(id).await?))
}

/// POST /api/projects - builders only
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<Project> {
    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        builder_id: user.user_id,
        name: body.name.trim().to_string(),
        description: body.description,
        address: body.address,
        location: body.location,
        status: body.status.unwrap_or(ProjectStatus::Upcoming),
        total_units: body.total_units,
        available_units: body.available_units.unwrap_or(body.total_units),
        price_range: body.price_range,
        amenities: body.amenities,
        images: body.images,
        rera_id: clean(body.rera_id),
        launch_date: body.launch_date,
        possession_date: body.possession_date,
        created_at: now,
        updated_at: now,
    };
    check_invariants(&project)?;
    state.collection::<Project>().insert(&project).await?;

    tracing::info!(project_id = %project.id, builder_id = %user.user_id, "project created");
    Ok(ApiResponse::created(project).message("Project created"))
}

/// PATCH /api/projects/:id - owning builder edits
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateProjectRequest>,
) -> ApiResult<Project> {
    let projects = state.collection::<Project>();
    let mut project = projects.get_404(id).await?;
    ensure_owner(project.builder_id, &user, "project")?;

    if let Some(name) = body.name {
        project.name = name.trim().to_string();
    }
    if let Some(description) = body.description {
        project.description = description;
    }
    if let Some(address) = body.address {
        project.address = address;
    }
    if body.location.is_some() {
        project.location = body.location;
    }
    if let Some(status) = body.status {
        project.status = status;
    }
    if let Some(total_units) = body.total_units {
        project.total_units = total_units;
    }
    if let Some(available_units) = body.available_units {
        project.available_units = available_units;
    }
    if let Some(price_range) = body.price_range {
        project.price_range = price_range;
    }
    if let Some(amenities) = body.amenities {
        project.amenities = amenities;
    }
    if let Some(images) = body.images {
        project.images = images;
    }
    if body.rera_id.is_some() {
        project.rera_id = clean(body.rera_id);
    }
    if body.launch_date.is_some() {
        project.launch_date = body.launch_date;
    }
    if body.possession_date.is_some() {
        project.possession_date = body.possession_date;
    }
    check_invariants(&project)?;

    project.updated_at = Utc::now();
    projects.save(&project).await?;
    Ok(ApiResponse::success(project).message("Project updated"))
}

/// DELETE /api/projects/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<()> {
    let projects = state.collection::<Project>();
    let project = projects.get_404(id).await?;
    ensure_owner(project.builder_id, &user, "project")?;

    projects.delete(id).await?;
    tracing::info!(project_id = %id, "project deleted");
    Ok(ApiResponse::success(()).message("Project deleted"))
}
