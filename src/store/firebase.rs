// src/store/firebase.rs
use async_trait::async_trait;
use firebase_rs::Firebase;
use serde_json::{json, Map, Value};

use super::{matches_all, Document, FieldUpdates, FieldValue, Filter, RecordStore};
use crate::errors::{SparrowError, SparrowResult};

/// Record store backed by the Firebase Realtime Database REST API.
///
/// The database has no compound null-equality queries, so each query reads
/// the whole collection and filters client-side.
pub struct FirebaseRecordStore {
    firebase: Firebase,
}

impl FirebaseRecordStore {
    pub fn new(database_url: &str, auth_token: Option<&str>) -> SparrowResult<Self> {
        let firebase = match auth_token {
            Some(token) => Firebase::auth(database_url, token),
            None => Firebase::new(database_url),
        }
        .map_err(|e| {
            SparrowError::InvalidConfiguration(format!("Firebase URL {database_url}: {e:?}"))
        })?;

        Ok(Self { firebase })
    }

    fn encode(fields: FieldUpdates) -> Value {
        let body: Map<String, Value> = fields
            .into_iter()
            .map(|(field, value)| {
                let value = match value {
                    FieldValue::Set(value) => value,
                    FieldValue::ServerTimestamp => json!({ ".sv": "timestamp" }),
                };
                (field, value)
            })
            .collect();
        Value::Object(body)
    }

    /// Turns a collection snapshot into documents that pass `filters`.
    ///
    /// The database returns sequential integer keys as an array, with `null`
    /// in the gaps, so both objects and arrays are accepted.
    fn documents_from_snapshot(
        collection: &str,
        snapshot: Value,
        filters: &[Filter],
    ) -> SparrowResult<Vec<Document>> {
        let records: Vec<(String, Value)> = match snapshot {
            Value::Null => Vec::new(),
            Value::Object(records) => records.into_iter().collect(),
            Value::Array(records) => records
                .into_iter()
                .enumerate()
                .filter(|(_, value)| !value.is_null())
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
            other => {
                return Err(SparrowError::query_failed(
                    collection,
                    format!("unexpected snapshot: {other}"),
                ));
            }
        };

        let mut documents = Vec::new();
        for (id, value) in records {
            match value {
                Value::Object(fields) if matches_all(filters, &fields) => {
                    documents.push(Document::new(id, fields));
                }
                Value::Object(_) => {}
                _ => tracing::warn!(collection, id = %id, "Skipping non-object record"),
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl RecordStore for FirebaseRecordStore {
    async fn query(&self, collection: &str, filters: &[Filter]) -> SparrowResult<Vec<Document>> {
        let snapshot = self
            .firebase
            .at(collection)
            .get::<Option<Value>>()
            .await
            .map_err(|e| SparrowError::query_failed(collection, format!("{e:?}")))?;

        let documents = Self::documents_from_snapshot(collection, snapshot.unwrap_or(Value::Null), filters)?;

        tracing::debug!(collection, matched = documents.len(), "Firebase query finished");
        Ok(documents)
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> SparrowResult<()> {
        let record = self.firebase.at(collection).at(id);

        // A PATCH on a missing path would create it; updates must only touch existing records.
        let existing = record
            .get::<Option<Value>>()
            .await
            .map_err(|e| SparrowError::update_failed(collection, id, format!("{e:?}")))?;
        if existing.is_none_or(|value| value.is_null()) {
            return Err(SparrowError::record_not_found(format!("{collection}/{id}")));
        }

        record
            .update(&Self::encode(fields))
            .await
            .map_err(|e| SparrowError::update_failed(collection, id, format!("{e:?}")))?;

        Ok(())
    }
}
