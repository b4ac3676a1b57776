use axum::extract::{Path, Query, State};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{clean, ensure_owner, ListQuery};
use crate::auth::Identity;
use crate::database::models::lease::{Lease, LeaseStatus};
use crate::database::models::notification::NotificationKind;
use crate::database::models::property::Property;
use crate::database::models::user::User;
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::services::notifications::notify;
use crate::state::AppState;
use crate::types::Role;

const SORTS: &[SortSpec] = &[
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
    SortSpec { key: "oldest", fields: &[("createdAt", SortDirection::Asc)] },
    SortSpec { key: "start_date", fields: &[("startDate", SortDirection::Asc)] },
    SortSpec { key: "end_date", fields: &[("endDate", SortDirection::Asc)] },
];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeaseRequest {
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub security_deposit: Option<Decimal>,
    #[validate(length(max = 5000, message = "Terms must be at most 5000 characters"))]
    pub terms: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeaseRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub monthly_rent: Option<Decimal>,
    pub security_deposit: Option<Decimal>,
    #[validate(length(max = 5000, message = "Terms must be at most 5000 characters"))]
    pub terms: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseSearch {
    pub status: Option<LeaseStatus>,
    pub property_id: Option<Uuid>,
}

fn check_terms(lease: &Lease) -> Result<(), ApiError> {
    if lease.end_date <= lease.start_date {
        return Err(ApiError::invalid_field("endDate", "End date must be after start date"));
    }
    if lease.monthly_rent <= Decimal::ZERO {
        return Err(ApiError::invalid_field("monthlyRent", "Monthly rent must be positive"));
    }
    if lease.security_deposit < Decimal::ZERO {
        return Err(ApiError::invalid_field("securityDeposit", "Security deposit cannot be negative"));
    }
    Ok(())
}

fn ensure_party(lease: &Lease, identity: &Identity) -> Result<(), ApiError> {
    if lease.is_party(identity.user_id) || identity.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("You are not a party to this lease"))
    }
}

fn refreshed(mut lease: Lease, now: DateTime<Utc>) -> Lease {
    lease.status = lease.derive_status(now);
    lease
}

/// POST /api/leases - landlord leases an owned property to a tenant
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateLeaseRequest>,
) -> ApiResult<Lease> {
    let property = state.collection::<Property>().get_404(body.property_id).await?;
    ensure_owner(property.owner_id, &user, "property")?;

    let tenant = state
        .collection::<User>()
        .get(body.tenant_id)
        .await?
        .ok_or_else(|| ApiError::invalid_field("tenantId", "Tenant not found"))?;
    if tenant.id == user.user_id {
        return Err(ApiError::invalid_field("tenantId", "You cannot lease a property to yourself"));
    }

    let now = Utc::now();
    let mut lease = Lease {
        id: Uuid::new_v4(),
        landlord_id: user.user_id,
        tenant_id: tenant.id,
        property_id: property.id,
        start_date: body.start_date,
        end_date: body.end_date,
        monthly_rent: body.monthly_rent,
        security_deposit: body.security_deposit.unwrap_or(Decimal::ZERO),
        terms: clean(body.terms),
        status: LeaseStatus::Upcoming,
        terminated_at: None,
        created_at: now,
        updated_at: now,
    };
    check_terms(&lease)?;
    lease.status = lease.derive_status(now);
    state.collection::<Lease>().insert(&lease).await?;

    notify(
        &state,
        tenant.id,
        NotificationKind::Lease,
        "New lease",
        format!("A lease for \"{}\" starts on {}", property.title, lease.start_date),
        Some(format!("/leases/{}", lease.id)),
    )
    .await;

    tracing::info!(lease_id = %lease.id, landlord_id = %user.user_id, tenant_id = %tenant.id, "lease created");
    Ok(ApiResponse::created(lease).message("Lease created"))
}

/// GET /api/leases - leases where the caller is landlord (landlords) or tenant (everyone else)
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
    Query(search): Query<LeaseSearch>,
) -> ApiResult<Page<Lease>> {
    let scope = match user.role {
        Role::Admin => Filter::new(),
        Role::Landlord => Filter::new().eq("landlordId", user.user_id),
        _ => Filter::new().eq("tenantId", user.user_id),
    };
    let now = Utc::now();
    let leases = state.collection::<Lease>();
    Lease::refresh_statuses(&leases, scope.clone(), now).await?;

    let mut filter = scope;
    if let Some(status) = search.status {
        filter = filter.eq("status", status);
    }
    if let Some(property_id) = search.property_id {
        filter = filter.eq("propertyId", property_id);
    }

    let page = leases
        .page(filter.with_order(query.order(SORTS)?), query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page.map(|lease| refreshed(lease, now))))
}

/// GET /api/leases/:id
pub async fn show(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<Lease> {
    let lease = state.collection::<Lease>().get_404(id).await?;
    ensure_party(&lease, &user)?;
    Ok(ApiResponse::success(refreshed(lease, Utc::now())))
}

/// PATCH /api/leases/:id
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateLeaseRequest>,
) -> ApiResult<Lease> {
    let leases = state.collection::<Lease>();
    let mut lease = leases.get_404(id).await?;
    ensure_owner(lease.landlord_id, &user, "lease")?;
    if lease.status == LeaseStatus::Terminated {
        return Err(ApiError::conflict("A terminated lease cannot be changed"));
    }

    if let Some(start_date) = body.start_date {
        lease.start_date = start_date;
    }
    if let Some(end_date) = body.end_date {
        lease.end_date = end_date;
    }
    if let Some(rent) = body.monthly_rent {
        lease.monthly_rent = rent;
    }
    if let Some(deposit) = body.security_deposit {
        lease.security_deposit = deposit;
    }
    if body.terms.is_some() {
        lease.terms = clean(body.terms);
    }
    check_terms(&lease)?;

    let now = Utc::now();
    lease.status = lease.derive_status(now);
    lease.updated_at = now;
    leases.save(&lease).await?;
    Ok(ApiResponse::success(lease).message("Lease updated"))
}

/// POST /api/leases/:id/terminate
pub async fn terminate(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<Lease> {
    let leases = state.collection::<Lease>();
    let mut lease = leases.get_404(id).await?;
    ensure_owner(lease.landlord_id, &user, "lease")?;
    if lease.status == LeaseStatus::Terminated {
        return Err(ApiError::conflict("Lease is already terminated"));
    }

    let now = Utc::now();
    lease.status = LeaseStatus::Terminated;
    lease.terminated_at = Some(now);
    lease.updated_at = now;
    leases.save(&lease).await?;

    notify(
        &state,
        lease.tenant_id,
        NotificationKind::Lease,
        "Lease terminated",
        format!("Your lease ending {} was terminated by the landlord", lease.end_date),
        Some(format!("/leases/{}", lease.id)),
    )
    .await;

    tracing::info!(lease_id = %id, "lease terminated");
    Ok(ApiResponse::success(lease).message("Lease terminated"))
}

/// DELETE /api/leases/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<()> {
    let leases = state.collection::<Lease>();
    let lease = leases.get_404(id).await?;
    ensure_owner(lease.landlord_id, &user, "lease")?;
    leases.delete(id).await?;
    Ok(ApiResponse::success(()).message("Lease deleted"))
}
