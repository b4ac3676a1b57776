use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use super::store::{DocumentStore, StoreError};
use crate::config::DatabaseConfig;
use crate::filter::{Filter, SqlParam};

const DOCUMENTS_TABLE: &str = "documents";

/// Document store over a single Postgres table holding one JSONB body per document.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the pool and make sure the documents table exists.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let raw = config.url.as_deref().ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let url = url::Url::parse(raw).map_err(|_| StoreError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url.as_str())
            .await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        info!("Connected document store: {}/{}", url.host_str().unwrap_or("localhost"), url.path().trim_start_matches('/'));
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id UUID NOT NULL,
                body JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS documents_body_gin ON documents USING GIN (body jsonb_path_ops)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, collection: &str, id: Uuid, body: Value) -> Result<(), StoreError> {
        let result = sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(Json(body))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Conflict(format!("{}/{}", collection, id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(body): Json<Value> = row.try_get("body")?;
                Ok(Some(body))
            }
            None => Ok(None),
        }
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        filter.validate()?;
        let sql_result = filter.to_sql(DOCUMENTS_TABLE)?;

        let mut q = sqlx::query(&sql_result.query).bind(collection);
        for p in sql_result.params {
            q = bind_param(q, p);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| -> Result<Value, StoreError> {
                let Json(body): Json<Value> = row.try_get("body")?;
                Ok(body)
            })
            .collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        filter.validate()?;
        let sql_result = filter.to_count_sql(DOCUMENTS_TABLE)?;

        let mut q = sqlx::query(&sql_result.query).bind(collection);
        for p in sql_result.params {
            q = bind_param(q, p);
        }

        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn replace(&self, collection: &str, id: Uuid, body: Value) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET body = $3, updated_at = now() WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(body))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed document store pool");
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    p: SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match p {
        SqlParam::Json(v) => q.bind(Json(v)),
        SqlParam::Text(s) => q.bind(s),
    }
}
