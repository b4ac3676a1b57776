use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::{Collection, Document};
use crate::database::store::StoreError;
use crate::filter::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Upcoming,
    Active,
    Expired,
    Terminated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub id: Uuid,
    pub landlord_id: Uuid,
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    #[serde(default)]
    pub security_deposit: Decimal,
    #[serde(default)]
    pub terms: Option<String>,
    pub status: LeaseStatus,
    #[serde(default)]
    pub terminated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Lease {
    const COLLECTION: &'static str = "leases";
    const LABEL: &'static str = "Lease";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Lease {
    /// Status implied by the lease dates. Termination is sticky.
    pub fn derive_status(&self, now: DateTime<Utc>) -> LeaseStatus {
        if self.status == LeaseStatus::Terminated {
            return LeaseStatus::Terminated;
        }
        let today = now.date_naive();
        if today < self.start_date {
            LeaseStatus::Upcoming
        } else if today <= self.end_date {
            LeaseStatus::Active
        } else {
            LeaseStatus::Expired
        }
    }

    /// Persist date-driven transitions for the open leases inside `scope`.
    pub async fn refresh_statuses(leases: &Collection<Lease>, scope: Filter, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let filter = scope.is_in("status", &[LeaseStatus::Upcoming, LeaseStatus::Active]);
        leases
            .refresh(&filter, |lease| {
                let status = lease.derive_status(now);
                let moved = status != lease.status;
                if moved {
                    lease.status = status;
                    lease.updated_at = now;
                }
                moved
            })
            .await
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.landlord_id == user_id || self.tenant_id == user_id
    }
}
