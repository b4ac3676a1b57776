use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::Document;
use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub license_number: String,
    pub agency_name: String,
    #[serde(default)]
    pub experience_years: Option<u32>,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderInfo {
    pub company_name: String,
    pub rera_number: String,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub kyc_verified: bool,
    #[serde(default)]
    pub agent_info: Option<AgentInfo>,
    #[serde(default)]
    pub builder_info: Option<BuilderInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    const LABEL: &'static str = "User";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl User {
    pub fn new(name: String, email: &str, password_hash: String, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: normalize_email(email),
            password_hash,
            phone: None,
            avatar_url: None,
            role,
            kyc_verified: false,
            agent_info: None,
            builder_info: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// User as returned by the API: everything except credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub kyc_verified: bool,
    pub agent_info: Option<AgentInfo>,
    pub builder_info: Option<BuilderInfo>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            avatar_url: user.avatar_url.clone(),
            role: user.role,
            kyc_verified: user.kyc_verified,
            agent_info: user.agent_info.clone(),
            builder_info: user.builder_info.clone(),
            created_at: user.created_at,
        }
    }
}

/// Contact card revealed through the `view_contact` entitlement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCard {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&User> for ContactCard {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
