// handlers/mod.rs - one module per resource; routes are wired in app.rs
pub mod agents;
pub mod appointments;
pub mod auth;
pub mod commercial;
pub mod favorites;
pub mod inquiries;
pub mod kyc;
pub mod leases;
pub mod notifications;
pub mod projects;
pub mod properties;
pub mod saved_searches;
pub mod subscriptions;
pub mod system;
pub mod utility_bills;
pub mod verification;

use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Identity;
use crate::config::ApiConfig;
use crate::database::PageRequest;
use crate::error::ApiError;
use crate::filter::filter_order::SortSpec;
use crate::filter::{FilterOrder, FilterOrderInfo, SortDirection};
use crate::types::Role;

/// Common listing parameters: `?page=&limit=&sort=`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self, api: &ApiConfig) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(api.default_page_size)
                .clamp(1, api.max_page_size),
        }
    }

    pub fn order(&self, allowed: &[SortSpec]) -> Result<Vec<FilterOrderInfo>, ApiError> {
        Ok(FilterOrder::resolve(self.sort.as_deref(), allowed)?)
    }
}

pub const DATE_SORTS: &[SortSpec] = &[
    SortSpec { key: "newest", fields: &[("createdAt", SortDirection::Desc)] },
    SortSpec { key: "oldest", fields: &[("createdAt", SortDirection::Asc)] },
];

/// Mutations are limited to the owning user; admins may act on anything.
pub fn ensure_owner(owner_id: Uuid, identity: &Identity, label: &str) -> Result<(), ApiError> {
    if owner_id == identity.user_id || identity.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!("You do not own this {}", label)))
    }
}

/// Trimmed, non-empty optional text.
pub fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn page_requests_are_clamped() {
        let api = AppConfig::development().api;
        let query = ListQuery { page: Some(0), limit: Some(10_000), sort: None };
        assert_eq!(query.page_request(&api), PageRequest { page: 1, limit: api.max_page_size });

        let defaults = ListQuery::default().page_request(&api);
        assert_eq!(defaults, PageRequest { page: 1, limit: api.default_page_size });
    }

    #[test]
    fn unknown_sort_keys_are_bad_requests() {
        let query = ListQuery { sort: Some("cheapest".into()), ..Default::default() };
        let err = query.order(DATE_SORTS).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
