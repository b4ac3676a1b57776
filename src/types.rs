/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role. Drives route gating and entitlement user-type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Tenant,
    Landlord,
    Agent,
    Builder,
    Admin,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::User,
        Role::Tenant,
        Role::Landlord,
        Role::Agent,
        Role::Builder,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Tenant => "tenant",
            Role::Landlord => "landlord",
            Role::Agent => "agent",
            Role::Builder => "builder",
            Role::Admin => "admin",
        }
    }

    /// Roles a visitor may pick at signup. Agent and builder are reached
    /// through a verification request; admin is never self-assigned.
    pub fn is_self_assignable(&self) -> bool {
        match self {
            Role::User | Role::Tenant | Role::Landlord => true,
            Role::Agent | Role::Builder | Role::Admin => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription plan tier. Declaration order is the tier ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanTier {
    Free,
    Basic,
    Standard,
    Premium,
    Boss,
}

impl PlanTier {
    pub const ALL: &'static [PlanTier] = &[
        PlanTier::Free,
        PlanTier::Basic,
        PlanTier::Standard,
        PlanTier::Premium,
        PlanTier::Boss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "FREE",
            PlanTier::Basic => "BASIC",
            PlanTier::Standard => "STANDARD",
            PlanTier::Premium => "PREMIUM",
            PlanTier::Boss => "BOSS",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
