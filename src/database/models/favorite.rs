use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::collection::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub property_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Document for Favorite {
    const COLLECTION: &'static str = "favorites";
    const LABEL: &'static str = "Favorite";

    fn id(&self) -> Uuid {
        self.id
    }
}
