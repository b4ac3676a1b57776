use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::{Collection, Document};
use crate::database::store::StoreError;
use crate::filter::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    Electricity,
    Water,
    Gas,
    Internet,
    Maintenance,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Paid,
    Overdue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilityBill {
    pub id: Uuid,
    pub landlord_id: Uuid,
    pub tenant_id: Uuid,
    pub property_id: Uuid,
    #[serde(default)]
    pub lease_id: Option<Uuid>,
    pub kind: UtilityKind,
    pub amount: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub status: BillStatus,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for UtilityBill {
    const COLLECTION: &'static str = "utility_bills";
    const LABEL: &'static str = "Utility bill";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl UtilityBill {
    /// Unpaid bills turn overdue the day after their due date.
    pub fn derive_status(&self, now: DateTime<Utc>) -> BillStatus {
        if self.paid_at.is_some() || self.status == BillStatus::Paid {
            BillStatus::Paid
        } else if now.date_naive() > self.due_date {
            BillStatus::Overdue
        } else {
            BillStatus::Pending
        }
    }

    /// Persist `overdue` on pending bills inside `scope` that are past due.
    pub async fn refresh_statuses(bills: &Collection<UtilityBill>, scope: Filter, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let filter = scope.eq("status", BillStatus::Pending);
        bills
            .refresh(&filter, |bill| {
                let status = bill.derive_status(now);
                let moved = status != bill.status;
                if moved {
                    bill.status = status;
                    bill.updated_at = now;
                }
                moved
            })
            .await
    }

    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.landlord_id == user_id || self.tenant_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unpaid_bill_goes_overdue_after_due_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let mut bill = UtilityBill {
            id: Uuid::new_v4(),
            landlord_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            lease_id: None,
            kind: UtilityKind::Electricity,
            amount: Decimal::new(1450, 0),
            period_start: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            status: BillStatus::Pending,
            paid_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(bill.derive_status(now), BillStatus::Pending);
        let next_day = Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 1).unwrap();
        assert_eq!(bill.derive_status(next_day), BillStatus::Overdue);

        bill.paid_at = Some(next_day);
        assert_eq!(bill.derive_status(next_day), BillStatus::Paid);
    }
}
