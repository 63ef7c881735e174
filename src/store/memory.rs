// src/store/memory.rs
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{matches_all, Document, FieldUpdates, FieldValue, Filter, RecordStore};
use crate::{
    clock::Clock,
    errors::{SparrowError, SparrowResult},
};

#[derive(Default)]
struct Faults {
    failing_queries: HashSet<String>,
    failing_updates: HashSet<(String, String)>,
}

/// In-process record store for development and tests.
///
/// Server timestamps resolve against the injected clock. Faults can be
/// injected per collection (queries) or per document (updates).
pub struct MemoryRecordStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Map<String, Value>>>>,
    faults: RwLock<Faults>,
    clock: Arc<dyn Clock>,
}

impl MemoryRecordStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            faults: RwLock::new(Faults::default()),
            clock,
        }
    }

    /// Stores a new document under a generated id and returns the id.
    pub async fn insert(&self, collection: &str, data: Value) -> SparrowResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.put(collection, &id, data).await?;
        Ok(id)
    }

    /// Creates or replaces the document at `collection/id`.
    pub async fn put(&self, collection: &str, id: &str, data: Value) -> SparrowResult<()> {
        let Value::Object(fields) = data else {
            return Err(SparrowError::bad_request(format!(
                "{collection}/{id} must be a JSON object"
            )));
        };

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone()))
    }

    pub async fn fail_queries_on(&self, collection: &str) {
        self.faults.write().await.failing_queries.insert(collection.to_string());
    }

    pub async fn fail_updates_of(&self, collection: &str, id: &str) {
        self.faults
            .write()
            .await
            .failing_updates
            .insert((collection.to_string(), id.to_string()));
    }

    pub async fn clear_faults(&self) {
        *self.faults.write().await = Faults::default();
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn query(&self, collection: &str, filters: &[Filter]) -> SparrowResult<Vec<Document>> {
        if self.faults.read().await.failing_queries.contains(collection) {
            return Err(SparrowError::query_failed(collection, "injected failure"));
        }

        let collections = self.collections.read().await;
        let documents = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| matches_all(filters, fields))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(documents)
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> SparrowResult<()> {
        let key = (collection.to_string(), id.to_string());
        if self.faults.read().await.failing_updates.contains(&key) {
            return Err(SparrowError::update_failed(collection, id, "injected failure"));
        }

        let now_millis = self.clock.now().timestamp_millis();
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| SparrowError::record_not_found(format!("{collection}/{id}")))?;

        for (field, value) in fields {
            let resolved = match value {
                FieldValue::Set(value) => value,
                FieldValue::ServerTimestamp => Value::from(now_millis),
            };
            document.insert(field, resolved);
        }

        Ok(())
    }
}
