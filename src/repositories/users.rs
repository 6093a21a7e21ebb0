use crate::error::Result;
use crate::repositories::store::DocumentStore;
use serde_json::{json, Value};
use std::sync::Arc;

pub const COLLECTION: &str = "users";

/// Per-user profile documents, keyed by user id.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn set_latest_analysis(&self, user_id: &str, analysis_id: &str) -> Result<()> {
        self.store
            .merge(COLLECTION, user_id, json!({ "latestAnalysisId": analysis_id }))
            .await
    }

    pub async fn latest_analysis_id(&self, user_id: &str) -> Result<Option<String>> {
        let doc = self.store.get(COLLECTION, user_id).await?;

        Ok(doc.and_then(|d| {
            d.body
                .get("latestAnalysisId")
                .and_then(Value::as_str)
                .map(str::to_string)
        }))
    }
}
