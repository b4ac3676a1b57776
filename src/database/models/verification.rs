use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::Document;
use crate::types::Role;

/// Roles reachable through a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedRole {
    Agent,
    Builder,
}

impl From<RequestedRole> for Role {
    fn from(requested: RequestedRole) -> Self {
        match requested {
            RequestedRole::Agent => Role::Agent,
            RequestedRole::Builder => Role::Builder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_role: RequestedRole,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub rera_number: Option<String>,
    pub status: VerificationStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<Uuid>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for VerificationRequest {
    const COLLECTION: &'static str = "verification_requests";
    const LABEL: &'static str = "Verification request";

    fn id(&self) -> Uuid {
        self.id
    }
}
