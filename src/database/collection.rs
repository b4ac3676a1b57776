use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::store::{DocumentStore, StoreError};
use crate::filter::Filter;

/// A typed document living in one store collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
    /// Human-readable name used in not-found messages
    const LABEL: &'static str;

    fn id(&self) -> Uuid;
}

/// One page of results plus the totals a client needs to paginate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<T>,
}

impl<T: Document> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    pub async fn insert(&self, doc: &T) -> Result<(), StoreError> {
        let body = self.encode(doc)?;
        self.store.insert(T::COLLECTION, doc.id(), body).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(body) => Ok(Some(self.decode(body)?)),
            None => Ok(None),
        }
    }

    pub async fn get_404(&self, id: Uuid) -> Result<T, StoreError> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} not found", T::LABEL)))
    }

    pub async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.store
            .find(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(|body| self.decode(body))
            .collect()
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<T>, StoreError> {
        let mut found = self.find(&filter.limit(1, None)).await?;
        Ok(found.pop())
    }

    pub async fn exists(&self, filter: Filter) -> Result<bool, StoreError> {
        Ok(self.count(&filter).await? > 0)
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.store.count(T::COLLECTION, filter).await
    }

    /// Run a filter through a page window and report totals.
    pub async fn page(&self, filter: Filter, request: PageRequest) -> Result<Page<T>, StoreError> {
        let total = self.count(&filter.without_window()).await?;
        let items = self
            .find(&filter.limit(request.limit, Some(request.offset())))
            .await?;
        let limit = request.limit.max(1);
        Ok(Page {
            items,
            page: request.page,
            limit,
            total,
            total_pages: total.div_ceil(limit as u64),
        })
    }

    /// Persist changes to an existing document.
    pub async fn save(&self, doc: &T) -> Result<(), StoreError> {
        let body = self.encode(doc)?;
        if self.store.replace(T::COLLECTION, doc.id(), body).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("{} not found", T::LABEL)))
        }
    }

    /// Re-apply `derive` to every document matching `filter` and persist the
    /// ones it reports as changed. Returns how many were saved.
    pub async fn refresh(&self, filter: &Filter, mut derive: impl FnMut(&mut T) -> bool) -> Result<usize, StoreError> {
        let mut saved = 0;
        for mut doc in self.find(filter).await? {
            if derive(&mut doc) {
                self.save(&doc).await?;
                saved += 1;
            }
        }
        Ok(saved)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.store.delete(T::COLLECTION, id).await
    }

    fn encode(&self, doc: &T) -> Result<serde_json::Value, StoreError> {
        serde_json::to_value(doc).map_err(|e| StoreError::Corrupt {
            collection: T::COLLECTION.to_string(),
            message: e.to_string(),
        })
    }

    fn decode(&self, body: serde_json::Value) -> Result<T, StoreError> {
        serde_json::from_value(body).map_err(|e| StoreError::Corrupt {
            collection: T::COLLECTION.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::filter::SortDirection;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: Uuid,
        rank: u32,
    }

    impl Document for Widget {
        const COLLECTION: &'static str = "widgets";
        const LABEL: &'static str = "Widget";

        fn id(&self) -> Uuid {
            self.id
        }
    }

    #[tokio::test]
    async fn pages_report_totals() {
        let widgets: Collection<Widget> = Collection::new(Arc::new(MemoryStore::new()));
        for rank in 0..7 {
            widgets.insert(&Widget { id: Uuid::new_v4(), rank }).await.unwrap();
        }

        let page = widgets
            .page(
                Filter::new().order_by("rank", SortDirection::Asc),
                PageRequest { page: 2, limit: 3 },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.iter().map(|w| w.rank).collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn refresh_persists_only_changed_documents() {
        let widgets: Collection<Widget> = Collection::new(Arc::new(MemoryStore::new()));
        for rank in 0..4 {
            widgets.insert(&Widget { id: Uuid::new_v4(), rank }).await.unwrap();
        }

        let saved = widgets
            .refresh(&Filter::new().gte("rank", 2), |w| {
                if w.rank == 3 {
                    w.rank = 30;
                    true
                } else {
                    false
                }
            })
            .await
            .unwrap();
        assert_eq!(saved, 1);
        assert_eq!(widgets.count(&Filter::new().eq("rank", 30)).await.unwrap(), 1);
        assert_eq!(widgets.count(&Filter::new().eq("rank", 3)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_and_get_404_report_missing_documents() {
        let widgets: Collection<Widget> = Collection::new(Arc::new(MemoryStore::new()));
        let ghost = Widget { id: Uuid::new_v4(), rank: 1 };
        assert!(matches!(widgets.save(&ghost).await, Err(StoreError::NotFound(_))));
        match widgets.get_404(ghost.id).await {
            Err(StoreError::NotFound(msg)) => assert_eq!(msg, "Widget not found"),
            other => panic!("unexpected: {:?}", other.map(|w| w.id)),
        }
    }
}
