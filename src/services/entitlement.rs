use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::database::models::subscription::{Subscription, UsageKind};
use crate::types::{PlanTier, Role};

/// Features sold through subscription plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    ViewContact,
    CreateListing,
    VirtualTour,
    AiInsights,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ViewContact => "view_contact",
            Feature::CreateListing => "create_listing",
            Feature::VirtualTour => "virtual_tour",
            Feature::AiInsights => "ai_insights",
        }
    }

    /// Metered features draw from a usage counter.
    pub fn usage(&self) -> Option<UsageKind> {
        match self {
            Feature::ViewContact => Some(UsageKind::Contacts),
            Feature::CreateListing => Some(UsageKind::Listings),
            Feature::VirtualTour | Feature::AiInsights => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EntitlementPolicy {
    pub feature: Feature,
    pub allowed_user_types: &'static [Role],
    pub min_plan: PlanTier,
}

const PROFESSIONALS: &[Role] = &[Role::Landlord, Role::Agent, Role::Builder, Role::Admin];

impl EntitlementPolicy {
    pub const VIEW_CONTACT: EntitlementPolicy = EntitlementPolicy {
        feature: Feature::ViewContact,
        allowed_user_types: Role::ALL,
        min_plan: PlanTier::Free,
    };

    pub const CREATE_LISTING: EntitlementPolicy = EntitlementPolicy {
        feature: Feature::CreateListing,
        allowed_user_types: Role::ALL,
        min_plan: PlanTier::Free,
    };

    pub const VIRTUAL_TOUR: EntitlementPolicy = EntitlementPolicy {
        feature: Feature::VirtualTour,
        allowed_user_types: Role::ALL,
        min_plan: PlanTier::Standard,
    };

    pub const AI_INSIGHTS: EntitlementPolicy = EntitlementPolicy {
        feature: Feature::AiInsights,
        allowed_user_types: PROFESSIONALS,
        min_plan: PlanTier::Premium,
    };

    pub fn requires_subscription(&self) -> bool {
        self.min_plan > PlanTier::Free || self.feature.usage().is_some()
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EntitlementError {
    #[error("No active subscription")]
    SubscriptionRequired,

    #[error("Subscription expired")]
    SubscriptionExpired,

    #[error("This feature is not available for {0} accounts")]
    UserTypeNotAllowed(Role),

    #[error("This feature requires the {0} plan or higher")]
    PlanUpgradeRequired(PlanTier),

    #[error("Usage limit reached")]
    UsageLimitReached,
}

impl EntitlementError {
    pub fn code(&self) -> &'static str {
        match self {
            EntitlementError::SubscriptionRequired => "SUBSCRIPTION_REQUIRED",
            EntitlementError::SubscriptionExpired => "SUBSCRIPTION_EXPIRED",
            EntitlementError::UserTypeNotAllowed(_) => "USER_TYPE_NOT_ALLOWED",
            EntitlementError::PlanUpgradeRequired(_) => "PLAN_UPGRADE_REQUIRED",
            EntitlementError::UsageLimitReached => "USAGE_LIMIT_REACHED",
        }
    }
}

/// Decide whether `role` may use the policy's feature right now.
///
/// Mutates the subscription in place: the lazy expiry flip and a counter
/// refresh are applied even when access is then denied, and the usage
/// counter is incremented only on success. Callers persist the subscription
/// whenever it differs from what they loaded.
pub fn check_entitlement(
    policy: &EntitlementPolicy,
    role: Role,
    subscription: Option<&mut Subscription>,
    now: DateTime<Utc>,
    refresh_days: i64,
) -> Result<(), EntitlementError> {
    let subscription = match subscription {
        Some(subscription) => subscription,
        None if policy.requires_subscription() => return Err(EntitlementError::SubscriptionRequired),
        None => return check_role(policy, role),
    };

    subscription.refresh_activity(now);
    if !subscription.is_active {
        return Err(EntitlementError::SubscriptionExpired);
    }

    check_role(policy, role)?;

    if subscription.plan < policy.min_plan {
        return Err(EntitlementError::PlanUpgradeRequired(policy.min_plan));
    }

    let Some(kind) = policy.feature.usage() else {
        return Ok(());
    };

    if subscription.counter(kind).is_exhausted() && subscription.refresh_date <= now {
        refresh_counters(subscription, now, refresh_days);
    }
    if subscription.counter(kind).is_exhausted() {
        return Err(EntitlementError::UsageLimitReached);
    }

    subscription.counter_mut(kind).used += 1;
    subscription.updated_at = now;
    Ok(())
}

fn check_role(policy: &EntitlementPolicy, role: Role) -> Result<(), EntitlementError> {
    if policy.allowed_user_types.contains(&role) {
        Ok(())
    } else {
        Err(EntitlementError::UserTypeNotAllowed(role))
    }
}

/// Zero both counters and roll the refresh date forward past `now`.
fn refresh_counters(subscription: &mut Subscription, now: DateTime<Utc>, refresh_days: i64) {
    let step = Duration::days(refresh_days.max(1));
    subscription.listings.used = 0;
    subscription.contacts.used = 0;
    while subscription.refresh_date <= now {
        subscription.refresh_date += step;
    }
    subscription.updated_at = now;
}
