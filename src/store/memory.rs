use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{Document, DocumentStore, Query, StoreError};

/// In-memory document store. Reference implementation of [`DocumentStore`]
/// used by tests and embeddable as a standalone backend.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(data: &Value, query: &Query) -> bool {
    query.conditions().iter().all(|(field, expected)| data.get(field) == Some(expected))
}

// RFC3339 strings order chronologically under plain string comparison, so
// timestamp fields need no special casing here.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document { id: id.to_string(), data: data.clone() }))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        let mut results: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| matches(data, query))
                    .map(|(id, data)| Document { id: id.clone(), data: data.clone() })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = query.order() {
            results.sort_by(|a, b| {
                let left = a.data.get(&order.field).unwrap_or(&Value::Null);
                let right = b.data.get(&order.field).unwrap_or(&Value::Null);
                let ordering = compare_values(left, right);
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        if let Some(limit) = query.limit_value() {
            results.truncate(limit);
        }

        Ok(results)
    }

    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        data: &Value,
    ) -> Result<String, StoreError> {
        let id = id.map(str::to_string).unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        collections.entry(collection.to_string()).or_default().insert(id.clone(), data.clone());
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        if let (Value::Object(target), Value::Object(fields)) = (doc, patch) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}
