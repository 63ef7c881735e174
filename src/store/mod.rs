// src/store/mod.rs
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::{SparrowError, SparrowResult};

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseRecordStore;
pub use memory::MemoryRecordStore;

/// A stored record: its key plus the JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self { id: id.into(), data }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> SparrowResult<T> {
        serde_json::from_value(Value::Object(self.data.clone()))
            .map_err(|e| SparrowError::malformed(&self.id, e.to_string()))
    }
}

/// Query predicate. A field that is absent from the document counts as null.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    IsNull(String),
    Equals(String, Value),
}

impl Filter {
    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::IsNull(field.into())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals(field.into(), value.into())
    }

    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        match self {
            Filter::IsNull(field) => data.get(field).is_none_or(Value::is_null),
            Filter::Equals(field, Value::Null) => data.get(field).is_none_or(Value::is_null),
            Filter::Equals(field, expected) => data.get(field) == Some(expected),
        }
    }
}

pub fn matches_all(filters: &[Filter], data: &Map<String, Value>) -> bool {
    filters.iter().all(|filter| filter.matches(data))
}

/// Value written by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Set(Value),
    /// Resolved by the store to its own current time, in epoch milliseconds.
    ServerTimestamp,
}

impl FieldValue {
    pub fn set(value: impl Into<Value>) -> Self {
        FieldValue::Set(value.into())
    }
}

pub type FieldUpdates = BTreeMap<String, FieldValue>;

/// Document database capability shared by every trigger handler.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query(&self, collection: &str, filters: &[Filter]) -> SparrowResult<Vec<Document>>;

    /// Merges `fields` into an existing document. Fails if the document is missing.
    async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> SparrowResult<()>;
}
