use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub reviewer_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document for Review {
    const COLLECTION: &'static str = "reviews";
    const LABEL: &'static str = "Review";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub count: usize,
    pub average: Option<f64>,
}

impl RatingSummary {
    pub fn of(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self { count: 0, average: None };
        }
        let sum: u32 = reviews.iter().map(|r| r.rating as u32).sum();
        let average = sum as f64 / reviews.len() as f64;
        Self {
            count: reviews.len(),
            average: Some((average * 10.0).round() / 10.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: Uuid::new_v4(),
            agent_id: Uuid::nil(),
            reviewer_id: Uuid::new_v4(),
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let summary = RatingSummary::of(&[review(5), review(4), review(4)]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, Some(4.3));
        assert_eq!(RatingSummary::of(&[]).average, None);
    }
}
