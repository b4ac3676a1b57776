use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::property::Property;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceVerdict {
    BelowMarket,
    AtMarket,
    AboveMarket,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInsight {
    pub property_id: Uuid,
    pub city: String,
    pub price_per_sqft: Option<Decimal>,
    pub city_average_per_sqft: Option<Decimal>,
    pub difference_percent: Option<Decimal>,
    pub comparable_count: usize,
    pub verdict: PriceVerdict,
}

/// Within this band of the city average a listing counts as at market.
const MARKET_BAND_PERCENT: i64 = 5;

/// Compare a listing's price per square foot with comparable listings.
pub fn price_insight(subject: &Property, comparables: &[Property]) -> PropertyInsight {
    let rates: Vec<Decimal> = comparables
        .iter()
        .filter(|p| p.id != subject.id && p.listing_type == subject.listing_type)
        .filter_map(Property::price_per_sqft)
        .collect();

    let average = if rates.is_empty() {
        None
    } else {
        let sum: Decimal = rates.iter().sum();
        Some((sum / Decimal::from(rates.len())).round_dp(2))
    };

    let own = subject.price_per_sqft();
    let difference_percent = match (own, average) {
        (Some(own), Some(avg)) if !avg.is_zero() => {
            Some(((own - avg) / avg * Decimal::ONE_HUNDRED).round_dp(1))
        }
        _ => None,
    };

    let band = Decimal::from(MARKET_BAND_PERCENT);
    let verdict = match difference_percent {
        Some(diff) if diff < -band => PriceVerdict::BelowMarket,
        Some(diff) if diff > band => PriceVerdict::AboveMarket,
        Some(_) => PriceVerdict::AtMarket,
        None => PriceVerdict::Unknown,
    };

    PropertyInsight {
        property_id: subject.id,
        city: subject.address.city.clone(),
        price_per_sqft: own,
        city_average_per_sqft: average,
        difference_percent,
        comparable_count: rates.len(),
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::property::{ListingType, PropertyStatus, PropertyType};
    use crate::database::models::Address;
    use chrono::Utc;

    fn listing(price: i64, area: u32) -> Property {
        let now = Utc::now();
        Property {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            agent_id: None,
            title: "Flat".into(),
            description: "Flat".into(),
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Sale,
            price: Decimal::new(price, 0),
            area_sqft: Some(area),
            bedrooms: None,
            bathrooms: None,
            address: Address {
                line: "1 Main Road".into(),
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
    fn pricier_listing_is_above_market() {
        let subject = listing(6_000_000, 1000);
        let comparables = vec![listing(5_000_000, 1000), listing(5_000_000, 1000), subject.clone()];
        let insight = price_insight(&subject, &comparables);
        assert_eq!(insight.comparable_count, 2);
        assert_eq!(insight.city_average_per_sqft, Some(Decimal::new(5000, 0)));
        assert_eq!(insight.difference_percent, Some(Decimal::new(200, 1)));
        assert_eq!(insight.verdict, PriceVerdict::AboveMarket);
    }

    #[test]
    fn no_comparables_means_unknown() {
        let subject = listing(6_000_000, 1000);
        let insight = price_insight(&subject, &[]);
        assert_eq!(insight.verdict, PriceVerdict::Unknown);
        assert_eq!(insight.city_average_per_sqft, None);
    }
}
