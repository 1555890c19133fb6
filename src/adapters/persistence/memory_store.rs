//! In-memory document store. Implements DocumentStore for tests and throwaway sessions.

use super::{MonotonicClock, new_document_id};
use crate::domain::DomainError;
use crate::ports::{Document, DocumentStore, Fields, Query};
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};

const CHANGE_BUFFER: usize = 64;

/// collection -> id -> document
type Collections = HashMap<String, HashMap<String, Document>>;

pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    clock: MonotonicClock,
    changes: broadcast::Sender<String>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            collections: RwLock::new(HashMap::new()),
            clock: MonotonicClock::default(),
            changes,
        }
    }

    fn notify(&self, collection: &str) {
        let _ = self.changes.send(collection.to_string());
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, data: Fields) -> Result<Document, DomainError> {
        let doc = Document {
            id: new_document_id(),
            created_at: self.clock.now(),
            data,
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(doc.id.clone(), doc.clone());
        self.notify(collection);
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), DomainError> {
        {
            let mut collections = self.collections.write().await;
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| DomainError::NotFound(format!("{}/{}", collection, id)))?;
            doc.data.extend(fields);
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DomainError> {
        let removed = self
            .collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if removed.is_none() {
            return Err(DomainError::NotFound(format!("{}/{}", collection, id)));
        }
        self.notify(collection);
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, DomainError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| query.compare(a, b));
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{SortDirection, TIMESTAMP_FIELD, to_fields};
    use serde_json::json;

    #[tokio::test]
    async fn query_orders_and_limits() {
        let store = MemoryDocumentStore::new();
        for name in ["Carla", "Ana", "Bruno"] {
            store
                .create("drivers", to_fields(&json!({ "name": name })).unwrap())
                .await
                .unwrap();
        }
        let q = Query::new("drivers", "name", SortDirection::Descending).with_limit(2);
        let names: Vec<_> = store
            .query(&q)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.data["name"].clone())
            .collect();
        assert_eq!(names, [json!("Carla"), json!("Bruno")]);
    }

    #[tokio::test]
    async fn empty_collection_is_empty() {
        let store = MemoryDocumentStore::new();
        let q = Query::new("logs", TIMESTAMP_FIELD, SortDirection::Descending);
        assert!(store.query(&q).await.unwrap().is_empty());
        assert!(store.get("logs", "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_delete() {
        let store = MemoryDocumentStore::new();
        let mut rx = store.changes();
        let doc = store
            .create("drivers", to_fields(&json!({"name": "Ana"})).unwrap())
            .await
            .unwrap();
        store
            .update("drivers", &doc.id, to_fields(&json!({"vehicle": "Fiorino"})).unwrap())
            .await
            .unwrap();
        let got = store.get("drivers", &doc.id).await.unwrap().unwrap();
        assert_eq!(got.data["name"], json!("Ana"));
        assert_eq!(got.data["vehicle"], json!("Fiorino"));

        store.delete("drivers", &doc.id).await.unwrap();
        assert!(matches!(
            store.delete("drivers", &doc.id).await,
            Err(DomainError::NotFound(_))
        ));
        for _ in 0..3 {
            assert_eq!(rx.recv().await.unwrap(), "drivers");
        }
    }
}
