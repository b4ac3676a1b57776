use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Address, GeoPoint};
use crate::database::collection::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Upcoming,
    UnderConstruction,
    ReadyToMove,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

/// Builder-run development with many units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub builder_id: Uuid,
    pub name: String,
    pub description: String,
    pub address: Address,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub status: ProjectStatus,
    pub total_units: u32,
    pub available_units: u32,
    pub price_range: PriceRange,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub rera_id: Option<String>,
    #[serde(default)]
    pub launch_date: Option<NaiveDate>,
    #[serde(default)]
    pub possession_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Project {
    const COLLECTION: &'static str = "projects";
    const LABEL: &'static str = "Project";

    fn id(&self) -> Uuid {
        self.id
    }
}
