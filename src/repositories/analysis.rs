use crate::analysis::AnalysisResult;
use crate::error::Result;
use crate::repositories::store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const COLLECTION: &str = "energyAnalysis";

/// One upload's results, one entry per feeder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDocument {
    pub file_name: String,
    pub uploaded_by: String,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<AnalysisResult>,
}

impl AnalysisDocument {
    pub fn result_for(&self, feeder_name: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.feeder_name == feeder_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredAnalysis {
    pub id: String,
    #[serde(flatten)]
    pub document: AnalysisDocument,
}

#[derive(Clone)]
pub struct AnalysisRepository {
    store: Arc<dyn DocumentStore>,
}

impl AnalysisRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, document: &AnalysisDocument) -> Result<String> {
        let body = serde_json::to_value(document)?;
        self.store.insert(COLLECTION, body).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<StoredAnalysis>> {
        let Some(doc) = self.store.get(COLLECTION, id).await? else {
            return Ok(None);
        };

        Ok(Some(StoredAnalysis {
            id: doc.id,
            document: serde_json::from_value(doc.body)?,
        }))
    }
}
