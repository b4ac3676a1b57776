use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::{Collection, Document, DocumentStore};
use crate::services::mailer::Mailer;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = Arc::new(TokenService::new(&config.security));
        Self {
            store,
            config: Arc::new(config),
            tokens,
            mailer,
        }
    }

    pub fn collection<T: Document>(&self) -> Collection<T> {
        Collection::new(self.store.clone())
    }
}
