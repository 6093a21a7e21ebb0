use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A stored JSON document and the id it was filed under.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Collections of schemaless JSON documents keyed by generated ids.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Files `body` under a fresh id and returns it.
    async fn insert(&self, collection: &str, body: Value) -> Result<String>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Documents whose top-level string `field` equals `value`. Unordered.
    async fn find_by_field(&self, collection: &str, field: &str, value: &str)
        -> Result<Vec<Document>>;

    /// Shallow-merges the keys of `patch` into the document, creating it
    /// when missing.
    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<()>;
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Process-local store for tests and database-less deployments.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, body: Value) -> Result<String> {
        let id = new_id();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), body);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|body| Document {
                id: id.to_string(),
                body: body.clone(),
            }))
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|(_, body)| body.get(field).and_then(Value::as_str) == Some(value))
            .map(|(id, body)| Document {
                id: id.clone(),
                body: body.clone(),
            })
            .collect())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<()> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Default::default()));

        match (doc, patch) {
            (Value::Object(existing), Value::Object(patch)) => existing.extend(patch),
            (doc, patch) => *doc = patch,
        }
        Ok(())
    }
}
