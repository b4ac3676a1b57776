use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use super::auth::identity_of;
use crate::database::models::subscription::Subscription;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::services::entitlement::{check_entitlement, EntitlementPolicy};
use crate::state::AppState;

/// State for one entitlement-gated route.
#[derive(Clone)]
pub struct EntitlementGate {
    pub state: AppState,
    pub policy: EntitlementPolicy,
}

impl EntitlementGate {
    pub fn new(state: &AppState, policy: EntitlementPolicy) -> Self {
        Self {
            state: state.clone(),
            policy,
        }
    }
}

/// Route layer enforcing a subscription entitlement and metering its use.
pub async fn require_entitlement(
    State(gate): State<EntitlementGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = identity_of(request.extensions())?;
    let subscriptions = gate.state.collection::<Subscription>();

    let mut subscription = subscriptions
        .find_one(Filter::new().eq("userId", identity.user_id))
        .await?;
    let loaded = subscription.clone();

    let outcome = check_entitlement(
        &gate.policy,
        identity.role,
        subscription.as_mut(),
        Utc::now(),
        gate.state.config.subscription.refresh_days,
    );

    // Expiry flips and counter refreshes stick even when access is denied
    if let Some(current) = subscription.as_ref() {
        if loaded.as_ref() != Some(current) {
            subscriptions.save(current).await?;
        }
    }

    if let Err(denied) = outcome {
        tracing::warn!(
            user_id = %identity.user_id,
            feature = gate.policy.feature.as_str(),
            "entitlement denied: {}",
            denied
        );
        return Err(denied.into());
    }

    tracing::debug!(user_id = %identity.user_id, feature = gate.policy.feature.as_str(), "entitlement granted");
    Ok(next.run(request).await)
}
