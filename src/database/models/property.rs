use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Address, GeoPoint};
use crate::database::collection::{Collection, Document};
use crate::database::store::StoreError;
use crate::filter::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Plot,
    Office,
    Shop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Active,
    Pending,
    Sold,
    Rented,
    Expired,
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: Decimal,
    #[serde(default)]
    pub area_sqft: Option<u32>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    pub address: Address,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub virtual_tour_url: Option<String>,
    pub status: PropertyStatus,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Property {
    const COLLECTION: &'static str = "properties";
    const LABEL: &'static str = "Property";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Property {
    /// Active listings past their expiry date read as expired.
    pub fn derive_status(&self, now: DateTime<Utc>) -> PropertyStatus {
        match (self.status, self.expires_at) {
            (PropertyStatus::Active, Some(expires_at)) if expires_at <= now => PropertyStatus::Expired,
            (status, _) => status,
        }
    }

    /// Persist `expired` on active listings whose expiry has passed, so status
    /// filters see the same value responses report.
    pub async fn expire_stale(properties: &Collection<Property>, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let filter = Filter::new()
            .eq("status", PropertyStatus::Active)
            .is_null("expiresAt", false);
        properties
            .refresh(&filter, |property| {
                let status = property.derive_status(now);
                let moved = status != property.status;
                if moved {
                    property.status = status;
                    property.updated_at = now;
                }
                moved
            })
            .await
    }

    pub fn price_per_sqft(&self) -> Option<Decimal> {
        match self.area_sqft {
            Some(area) if area > 0 => Some((self.price / Decimal::from(area)).round_dp(2)),
            _ => None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(now: DateTime<Utc>) -> Property {
        Property {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            agent_id: None,
            title: "2BHK near metro".into(),
            description: "Bright flat".into(),
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Sale,
            price: Decimal::new(5_000_000, 0),
            area_sqft: Some(1000),
            bedrooms: Some(2),
            bathrooms: Some(2),
            address: Address {
                line: "12 MG Road".into(),
                city: "Pune".into(),
                state: "MH".into(),
                country: "India".into(),
                postal_code: None,
            },
            location: None,
            amenities: vec![],
            images: vec![],
            virtual_tour_url: None,
            status: PropertyStatus::Active,
            views: 0,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn active_listing_expires_after_expiry_date() {
        let now = Utc::now();
        let mut property = sample(now);
        assert_eq!(property.derive_status(now), PropertyStatus::Active);

        property.expires_at = Some(now - Duration::days(1));
        assert_eq!(property.derive_status(now), PropertyStatus::Expired);

        property.status = PropertyStatus::Sold;
        assert_eq!(property.derive_status(now), PropertyStatus::Sold);
    }

    #[test]
    fn price_per_sqft_needs_an_area() {
        let mut property = sample(Utc::now());
        assert_eq!(property.price_per_sqft(), Some(Decimal::new(5000, 0)));
        property.area_sqft = None;
        assert_eq!(property.price_per_sqft(), None);
    }
}

/// Listing search criteria. Taken from the query string and stored in saved searches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySearch {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub listing_type: Option<ListingType>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
    /// Title substring
    #[serde(default)]
    pub q: Option<String>,
}

impl PropertySearch {
    /// Public searches only see active listings unless a status is asked for.
    pub fn to_filter(&self) -> crate::filter::Filter {
        let mut filter = crate::filter::Filter::new().eq("status", self.status.unwrap_or(PropertyStatus::Active));
        if let Some(city) = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            filter = filter.contains("address.city", city);
        }
        if let Some(property_type) = self.property_type {
            filter = filter.eq("propertyType", property_type);
        }
        if let Some(listing_type) = self.listing_type {
            filter = filter.eq("listingType", listing_type);
        }
        if let Some(min) = self.min_price {
            filter = filter.gte("price", min);
        }
        if let Some(max) = self.max_price {
            filter = filter.lte("price", max);
        }
        if let Some(bedrooms) = self.bedrooms {
            filter = filter.gte("bedrooms", bedrooms);
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            filter = filter.contains("title", q);
        }
        filter
    }
}

#[cfg(test)]
mod search_tests {
    use super::*;
    use crate::filter::filter_match::FilterMatch;
    use serde_json::json;

    #[test]
    fn search_defaults_to_active_listings() {
        let filter = PropertySearch::default().to_filter();
        assert!(FilterMatch::matches(&filter, &json!({ "status": "active" })));
        assert!(!FilterMatch::matches(&filter, &json!({ "status": "sold" })));
    }

    #[test]
    fn search_combines_price_band_and_city() {
        let search = PropertySearch {
            city: Some("pune".into()),
            min_price: Some(Decimal::new(1_000_000, 0)),
            max_price: Some(Decimal::new(2_000_000, 0)),
            ..Default::default()
        };
        let filter = search.to_filter();
        let inside = json!({ "status": "active", "price": 1500000.0, "address": { "city": "Pune" } });
        let outside = json!({ "status": "active", "price": 2500000.0, "address": { "city": "Pune" } });
        assert!(FilterMatch::matches(&filter, &inside));
        assert!(!FilterMatch::matches(&filter, &outside));
    }
}
