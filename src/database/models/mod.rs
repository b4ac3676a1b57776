pub mod appointment;
pub mod commercial;
pub mod favorite;
pub mod inquiry;
pub mod kyc;
pub mod lease;
pub mod notification;
pub mod project;
pub mod property;
pub mod review;
pub mod saved_search;
pub mod subscription;
pub mod user;
pub mod utility_bill;
pub mod verification;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Postal address shared by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 3, max = 300, message = "Address line must be between 3 and 300 characters"))]
    pub line: String,
    #[validate(length(min = 2, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 2, max = 100, message = "State is required"))]
    pub state: String,
    #[serde(default = "default_country")]
    #[validate(length(min = 2, max = 100))]
    pub country: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
}

fn default_country() -> String {
    "India".to_string()
}

/// WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeoPoint {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub lng: f64,
}
