use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{DocumentStore, StoreError};
use crate::filter::filter_match::FilterMatch;
use crate::filter::Filter;

/// Process-local document store. Used for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    // Vec keeps insertion order so unsorted finds are stable
    collections: RwLock<HashMap<String, Vec<(Uuid, Value)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, id: Uuid, body: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|(existing, _)| *existing == id) {
            return Err(StoreError::Conflict(format!("{}/{}", collection, id)));
        }
        docs.push((id, body));
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|(existing, _)| *existing == id))
            .map(|(_, body)| body.clone()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        filter.validate()?;
        let collections = self.collections.read().await;
        let mut matched: Vec<Value> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, body)| FilterMatch::matches(filter, body))
                    .map(|(_, body)| body.clone())
                    .collect()
            })
            .unwrap_or_default();

        if !filter.order().is_empty() {
            matched.sort_by(|a, b| FilterMatch::compare_docs(filter.order(), a, b));
        }

        let offset = filter.offset_value().unwrap_or(0) as usize;
        let limit = filter.limit_value().map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        filter.validate()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|(_, body)| FilterMatch::matches(filter, body)).count() as u64)
            .unwrap_or(0))
    }

    async fn replace(&self, collection: &str, id: Uuid, body: Value) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        match collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(existing, _)| *existing == id))
        {
            Some((_, stored)) => {
                *stored = body;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|(existing, _)| *existing != id);
        Ok(docs.len() != before)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SortDirection;
    use serde_json::json;

    #[tokio::test]
    async fn insert_get_replace_delete() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert("things", id, json!({ "id": id, "n": 1 })).await.unwrap();
        assert!(matches!(
            store.insert("things", id, json!({})).await,
            Err(StoreError::Conflict(_))
        ));

        assert!(store.replace("things", id, json!({ "id": id, "n": 2 })).await.unwrap());
        assert_eq!(store.get("things", id).await.unwrap().unwrap()["n"], 2);

        assert!(store.delete("things", id).await.unwrap());
        assert!(!store.delete("things", id).await.unwrap());
        assert!(store.get("things", id).await.unwrap().is_none());
        assert!(!store.replace("things", id, json!({})).await.unwrap());
    }

    #[tokio::test]
    async fn find_applies_filter_order_and_window() {
        let store = MemoryStore::new();
        for n in 1..=5 {
            store.insert("things", Uuid::new_v4(), json!({ "n": n, "even": n % 2 == 0 })).await.unwrap();
        }
        let filter = Filter::new()
            .eq("even", false)
            .order_by("n", SortDirection::Desc)
            .limit(2, Some(1));
        let found = store.find("things", &filter).await.unwrap();
        let ns: Vec<i64> = found.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![3, 1]);
        assert_eq!(store.count("things", &filter).await.unwrap(), 3);
    }
}
