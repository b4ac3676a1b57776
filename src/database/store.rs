use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::filter::{Filter, FilterError};

/// Errors from a document store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate document: {0}")]
    Conflict(String),

    #[error("Invalid query: {0}")]
    Query(#[from] FilterError),

    #[error("Corrupt document in {collection}: {message}")]
    Corrupt { collection: String, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Id-keyed JSON document storage, partitioned by collection name.
///
/// Documents are whole JSON objects; updates replace the stored body.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document. Fails with `Conflict` if the id already exists.
    async fn insert(&self, collection: &str, id: Uuid, body: Value) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    /// Count documents matching the filter's conditions; order and window are ignored.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Replace an existing document. Returns false when no document has that id.
    async fn replace(&self, collection: &str, id: Uuid, body: Value) -> Result<bool, StoreError>;

    /// Remove a document. Returns false when no document has that id.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    /// Release backend resources on shutdown.
    async fn close(&self) {}
}
