use axum::extract::{Path, Query, State};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{clean, ensure_owner, ListQuery};
use crate::database::models::lease::Lease;
use crate::database::models::notification::NotificationKind;
use crate::database::models::property::Property;
use crate::database::models::user::User;
use crate::database::models::utility_bill::{BillStatus, UtilityBill, UtilityKind};
use crate::database::Page;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{Filter, SortDirection};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::services::notifications::notify;
use crate::state::AppState;
use crate::types::Role;

const SORTS: &[SortSpec] = &[
    SortSpec { key: "due_date", fields: &[("dueDate", SortDirection::Asc)] },
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
    SortSpec { key: "oldest", fields: &[("createdAt", SortDirection::Asc)] },
    SortSpec { key: "amount_desc", fields: &[("amount", SortDirection::Desc)] },
];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    pub lease_id: Option<Uuid>,
    pub kind: UtilityKind,
    pub amount: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillRequest {
    pub kind: Option<UtilityKind>,
    pub amount: Option<Decimal>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSearch {
    pub status: Option<BillStatus>,
    pub kind: Option<UtilityKind>,
    pub property_id: Option<Uuid>,
    pub lease_id: Option<Uuid>,
}

fn check_bill(bill: &UtilityBill) -> Result<(), ApiError> {
    if bill.amount <= Decimal::ZERO {
        return Err(ApiError::invalid_field("amount", "Amount must be positive"));
    }
    if bill.period_end <= bill.period_start {
        return Err(ApiError::invalid_field("periodEnd", "Billing period end must be after its start"));
    }
    Ok(())
}

fn refreshed(mut bill: UtilityBill, now: DateTime<Utc>) -> UtilityBill {
    bill.status = bill.derive_status(now);
    bill
}

/// POST /api/utility-bills - landlord bills a tenant
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateBillRequest>,
) -> ApiResult<UtilityBill> {
    let property = state.collection::<Property>().get_404(body.property_id).await?;
    ensure_owner(property.owner_id, &user, "property")?;

    let tenant_exists = state.collection::<User>().get(body.tenant_id).await?.is_some();
    if !tenant_exists {
        return Err(ApiError::invalid_field("tenantId", "Tenant not found"));
    }

    if let Some(lease_id) = body.lease_id {
        let lease = state
            .collection::<Lease>()
            .get(lease_id)
            .await?
            .ok_or_else(|| ApiError::invalid_field("leaseId", "Lease not found"))?;
        if lease.tenant_id != body.tenant_id || lease.property_id != body.property_id {
            return Err(ApiError::invalid_field("leaseId", "Lease does not match this tenant and property"));
        }
    }

    let now = Utc::now();
    let mut bill = UtilityBill {
        id: Uuid::new_v4(),
        landlord_id: property.owner_id,
        tenant_id: body.tenant_id,
        property_id: property.id,
        lease_id: body.lease_id,
        kind: body.kind,
        amount: body.amount,
        period_start: body.period_start,
        period_end: body.period_end,
        due_date: body.due_date,
        status: BillStatus::Pending,
        paid_at: None,
        notes: clean(body.notes),
        created_at: now,
        updated_at: now,
    };
    check_bill(&bill)?;
    bill.status = bill.derive_status(now);
    state.collection::<UtilityBill>().insert(&bill).await?;

    notify(
        &state,
        bill.tenant_id,
        NotificationKind::Bill,
        "New utility bill",
        format!("A bill of {} for \"{}\" is due on {}", bill.amount, property.title, bill.due_date),
        Some(format!("/utility-bills/{}", bill.id)),
    )
    .await;

    Ok(ApiResponse::created(bill).message("Utility bill created"))
}

/// GET /api/utility-bills
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
    Query(search): Query<BillSearch>,
) -> ApiResult<Page<UtilityBill>> {
    let scope = match user.role {
        Role::Admin => Filter::new(),
        Role::Landlord => Filter::new().eq("landlordId", user.user_id),
        _ => Filter::new().eq("tenantId", user.user_id),
    };
    let now = Utc::now();
    let bills = state.collection::<UtilityBill>();
    UtilityBill::refresh_statuses(&bills, scope.clone(), now).await?;

    let mut filter = scope;
    if let Some(status) = search.status {
        filter = filter.eq("status", status);
    }
    if let Some(kind) = search.kind {
        filter = filter.eq("kind", kind);
    }
    if let Some(property_id) = search.property_id {
        filter = filter.eq("propertyId", property_id);
    }
    if let Some(lease_id) = search.lease_id {
        filter = filter.eq("leaseId", lease_id);
    }

    let page = bills
        .page(filter.with_order(query.order(SORTS)?), query.page_request(&state.config.api))
        .await?;
    Ok(ApiResponse::success(page.map(|bill| refreshed(bill, now))))
}

/// GET /api/utility-bills/:id
pub async fn show(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<UtilityBill> {
    let bill = state.collection::<UtilityBill>().get_404(id).await?;
    if !bill.is_party(user.user_id) && user.role != Role::Admin {
        return Err(ApiError::forbidden("You are not a party to this bill"));
    }
    Ok(ApiResponse::success(refreshed(bill, Utc::now())))
}

/// PATCH /api/utility-bills/:id
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateBillRequest>,
) -> ApiResult<UtilityBill> {
    let bills = state.collection::<UtilityBill>();
    let mut bill = bills.get_404(id).await?;
    ensure_owner(bill.landlord_id, &user, "bill")?;
    if bill.paid_at.is_some() {
        return Err(ApiError::conflict("A paid bill cannot be changed"));
    }

    if let Some(kind) = body.kind {
        bill.kind = kind;
    }
    if let Some(amount) = body.amount {
        bill.amount = amount;
    }
    if let Some(start) = body.period_start {
        bill.period_start = start;
    }
    if let Some(end) = body.period_end {
        bill.period_end = end;
    }
    if let Some(due) = body.due_date {
        bill.due_date = due;
    }
    if body.notes.is_some() {
        bill.notes = clean(body.notes);
    }
    check_bill(&bill)?;

    let now = Utc::now();
    bill.status = bill.derive_status(now);
    bill.updated_at = now;
    bills.save(&bill).await?;
    Ok(ApiResponse::success(bill).message("Utility bill updated"))
}

/// DELETE /api/utility-bills/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<()> {
    let bills = state.collection::<UtilityBill>();
    let bill = bills.get_404(id).await?;
    ensure_owner(bill.landlord_id, &user, "bill")?;
    bills.delete(id).await?;
    Ok(ApiResponse::success(()).message("Utility bill deleted"))
}

/// POST /api/utility-bills/:id/pay - tenant settles a bill
pub async fn pay(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<UtilityBill> {
    let bills = state.collection::<UtilityBill>();
    let mut bill = bills.get_404(id).await?;
    if bill.tenant_id != user.user_id {
        return Err(ApiError::forbidden("Only the billed tenant can pay this bill"));
    }
    if bill.paid_at.is_some() {
        return Err(ApiError::conflict("Bill is already paid"));
    }

    let now = Utc::now();
    bill.paid_at = Some(now);
    bill.status = bill.derive_status(now);
    bill.updated_at = now;
    bills.save(&bill).await?;

    notify(
        &state,
        bill.landlord_id,
        NotificationKind::Bill,
        "Bill paid",
        format!("A bill of {} due {} was paid", bill.amount, bill.due_date),
        Some(format!("/utility-bills/{}", bill.id)),
    )
    .await;

    tracing::info!(bill_id = %id, tenant_id = %user.user_id, "utility bill paid");
    Ok(ApiResponse::success(bill).message("Bill paid"))
}
