use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::property::PropertySearch;
use crate::database::collection::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub criteria: PropertySearch,
    #[serde(default)]
    pub alerts_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for SavedSearch {
    const COLLECTION: &'static str = "saved_searches";
    const LABEL: &'static str = "Saved search";

    fn id(&self) -> Uuid {
        self.id
    }
}
