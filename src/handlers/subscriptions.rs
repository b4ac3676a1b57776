use axum::extract::{Path, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::models::subscription::{PaymentRecord, PlanQuota, Subscription};
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;
use crate::types::PlanTier;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanCatalog {
    pub plans: Vec<PlanQuota>,
    pub period_days: i64,
    pub refresh_days: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignPlanRequest {
    pub plan: PlanTier,
    #[validate(length(min = 3, max = 100, message = "Payment reference must be between 3 and 100 characters"))]
    pub payment_reference: Option<String>,
}

/// GET /api/subscriptions/plans - public catalog
pub async fn plans(State(state): State<AppState>) -> ApiResult<PlanCatalog> {
    Ok(ApiResponse::success(PlanCatalog {
        plans: PlanQuota::catalog(),
        period_days: state.config.subscription.period_days,
        refresh_days: state.config.subscription.refresh_days,
    }))
}

/// GET /api/subscriptions/me - current plan and usage
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Subscription> {
    let subscriptions = state.collection::<Subscription>();
    let mut subscription = subscriptions
        .find_one(Filter::new().eq("userId", user.user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("No subscription found"))?;

    if subscription.refresh_activity(Utc::now()) {
        subscriptions.save(&subscription).await?;
    }
    Ok(ApiResponse::success(subscription))
}

/// PUT /api/admin/subscriptions/:user_id - move a user onto a plan, recording the payment
pub async fn assign(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(user_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<AssignPlanRequest>,
) -> ApiResult<Subscription> {
    state.collection::<User>().get_404(user_id).await?;

    let now = Utc::now();
    let config = &state.config.subscription;
    let payment = body.payment_reference.map(|reference| PaymentRecord {
        reference: reference.trim().to_string(),
        plan: body.plan,
        amount: PlanQuota::for_plan(body.plan).price,
        paid_at: now,
    });

    let subscriptions = state.collection::<Subscription>();
    let subscription = match subscriptions.find_one(Filter::new().eq("userId", user_id)).await? {
        Some(mut existing) => {
            existing.activate(body.plan, now, config.period_days, config.refresh_days, payment);
            subscriptions.save(&existing).await?;
            existing
        }
        None => {
            let mut fresh = Subscription::free(user_id, now, config.refresh_days);
            fresh.activate(body.plan, now, config.period_days, config.refresh_days, payment);
            subscriptions.insert(&fresh).await?;
            fresh
        }
    };

    tracing::info!(%user_id, plan = %body.plan, admin_id = %admin.user_id, "subscription plan assigned");
    Ok(ApiResponse::success(subscription).message(format!("Plan set to {}", body.plan)))
}
