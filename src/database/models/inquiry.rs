use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    New,
    Contacted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Closed => "closed",
        }
    }

    pub fn can_transition_to(&self, next: InquiryStatus) -> bool {
        matches!(
            (self, next),
            (InquiryStatus::New, InquiryStatus::Contacted)
                | (InquiryStatus::New, InquiryStatus::Closed)
                | (InquiryStatus::Contacted, InquiryStatus::Closed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: Uuid,
    pub property_id: Uuid,
    pub property_owner_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Inquiry {
    const COLLECTION: &'static str = "inquiries";
    const LABEL: &'static str = "Inquiry";

    fn id(&self) -> Uuid {
        self.id
    }
}
