use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::Document;
use crate::types::PlanTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
    pub used: u32,
    pub total: u32,
}

impl UsageCounter {
    pub fn new(total: u32) -> Self {
        Self { used: 0, total }
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.total
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.used)
    }
}

/// Which usage counter a metered feature draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Listings,
    Contacts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub reference: String,
    pub plan: PlanTier,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: PlanTier,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub listings: UsageCounter,
    pub contacts: UsageCounter,
    pub refresh_date: DateTime<Utc>,
    #[serde(default)]
    pub payment_history: Vec<PaymentRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Subscription {
    const COLLECTION: &'static str = "subscriptions";
    const LABEL: &'static str = "Subscription";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Subscription {
    /// FREE plan provisioned at signup. It has no end date.
    pub fn free(user_id: Uuid, now: DateTime<Utc>, refresh_days: i64) -> Self {
        let quota = PlanQuota::for_plan(PlanTier::Free);
        Self {
            id: Uuid::new_v4(),
            user_id,
            plan: PlanTier::Free,
            is_active: true,
            start_date: now,
            end_date: None,
            listings: UsageCounter::new(quota.listings),
            contacts: UsageCounter::new(quota.contacts),
            refresh_date: now + Duration::days(refresh_days),
            payment_history: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    /// Lazy expiry: flip `is_active` off once `end_date` has passed.
    /// Returns true when the flag changed and the document needs saving.
    pub fn refresh_activity(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self.end_date.map_or(false, |end| end <= now);
        if self.is_active && expired {
            self.is_active = false;
            self.updated_at = now;
            return true;
        }
        false
    }

    pub fn counter(&self, kind: UsageKind) -> &UsageCounter {
        match kind {
            UsageKind::Listings => &self.listings,
            UsageKind::Contacts => &self.contacts,
        }
    }

    pub fn counter_mut(&mut self, kind: UsageKind) -> &mut UsageCounter {
        match kind {
            UsageKind::Listings => &mut self.listings,
            UsageKind::Contacts => &mut self.contacts,
        }
    }

    /// Move onto a plan for one billing period with fresh quotas.
    pub fn activate(
        &mut self,
        plan: PlanTier,
        now: DateTime<Utc>,
        period_days: i64,
        refresh_days: i64,
        payment: Option<PaymentRecord>,
    ) {
        let quota = PlanQuota::for_plan(plan);
        self.plan = plan;
        self.is_active = true;
        self.start_date = now;
        self.end_date = match plan {
            PlanTier::Free => None,
            _ => Some(now + Duration::days(period_days)),
        };
        self.listings = UsageCounter::new(quota.listings);
        self.contacts = UsageCounter::new(quota.contacts);
        self.refresh_date = now + Duration::days(refresh_days);
        if let Some(payment) = payment {
            self.payment_history.push(payment);
        }
        self.updated_at = now;
    }
}

/// Per-period quota and list price of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanQuota {
    pub plan: PlanTier,
    pub listings: u32,
    pub contacts: u32,
    pub price: Decimal,
}

impl PlanQuota {
    pub fn for_plan(plan: PlanTier) -> Self {
        let (listings, contacts, price) = match plan {
            PlanTier::Free => (1, 5, 0),
            PlanTier::Basic => (5, 25, 499),
            PlanTier::Standard => (15, 75, 999),
            PlanTier::Premium => (50, 200, 1999),
            PlanTier::Boss => (200, 1000, 4999),
        };
        Self {
            plan,
            listings,
            contacts,
            price: Decimal::new(price, 0),
        }
    }

    pub fn catalog() -> Vec<Self> {
        PlanTier::ALL.iter().copied().map(Self::for_plan).collect()
    }
}
