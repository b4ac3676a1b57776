use chrono::Utc;
use uuid::Uuid;

use crate::database::models::notification::{Notification, NotificationKind};
use crate::state::AppState;

/// Best effort: a failed notification never fails the request that caused it.
pub async fn notify(
    state: &AppState,
    user_id: Uuid,
    kind: NotificationKind,
    title: &str,
    message: String,
    link: Option<String>,
) {
    let notification = Notification::new(user_id, kind, title, message, link, Utc::now());
    if let Err(e) = state.collection::<Notification>().insert(&notification).await {
        tracing::warn!(%user_id, "failed to store notification: {}", e);
    }
}
