pub mod memory;
pub mod models;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod collections {
    pub const QUESTIONS: &str = "questions";
    pub const EXAM_SESSIONS: &str = "examSessions";
    pub const USER_PROGRESS: &str = "userProgress";
    pub const USERS: &str = "users";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound { collection: collection.to_string(), id: id.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Equality-filtered query with optional ordering and limit; the full query
/// surface the core needs from a document store.
#[derive(Debug, Clone, Default)]
pub struct Query {
    conditions: Vec<(String, Value)>,
    order_by: Option<OrderBy>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn order_desc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy { field: field.to_string(), descending: true });
        self
    }

    pub fn order_asc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy { field: field.to_string(), descending: false });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn order(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }
}

/// Capability interface over the backing document database. Any store with
/// per-document write atomicity satisfies the core's needs; the crate ships
/// [`memory::MemoryStore`] as the reference implementation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Inserts a document. With `id == None` the store assigns a fresh id;
    /// with an explicit id the document is created or replaced at that key.
    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        data: &Value,
    ) -> Result<String, StoreError>;

    /// Shallow-merges `patch` fields into an existing document.
    async fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
