use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::property::PropertyStatus;
use super::Address;
use crate::database::collection::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommercialType {
    Office,
    Retail,
    Warehouse,
    Industrial,
}

/// Fractional-ownership commercial asset held through an SPV.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommercialProperty {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub address: Address,
    pub commercial_type: CommercialType,
    pub spv_id: String,
    pub total_shares: u32,
    pub available_shares: u32,
    pub price_per_share: Decimal,
    #[serde(default)]
    pub expected_yield: Option<Decimal>,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for CommercialProperty {
    const COLLECTION: &'static str = "commercial_properties";
    const LABEL: &'static str = "Commercial property";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl CommercialProperty {
    pub fn sold_shares(&self) -> u32 {
        self.total_shares.saturating_sub(self.available_shares)
    }
}

/// SPV ids compare case-insensitively and ignore surrounding whitespace.
pub fn normalize_spv_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}
