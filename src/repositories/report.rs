use crate::analysis::float;
use crate::error::Result;
use crate::repositories::store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const COLLECTION: &str = "efficiencyReports";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyReportDocument {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(with = "float")]
    pub overall_efficiency: f64,
    #[serde(with = "float")]
    pub energy_savings: f64,
    #[serde(with = "float")]
    pub cost_savings: f64,
    #[serde(with = "float")]
    pub carbon_reduction: f64,
    pub recommendations: Vec<String>,
    pub analysis_id: String,
    pub feeder_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredReport {
    pub id: String,
    #[serde(flatten)]
    pub document: EfficiencyReportDocument,
}

#[derive(Clone)]
pub struct ReportRepository {
    store: Arc<dyn DocumentStore>,
}

impl ReportRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, report: &EfficiencyReportDocument) -> Result<String> {
        let body = serde_json::to_value(report)?;
        self.store.insert(COLLECTION, body).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<StoredReport>> {
        let Some(doc) = self.store.get(COLLECTION, id).await? else {
            return Ok(None);
        };

        Ok(Some(StoredReport {
            id: doc.id,
            document: serde_json::from_value(doc.body)?,
        }))
    }

    /// Newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<StoredReport>> {
        let docs = self.store.find_by_field(COLLECTION, "userId", user_id).await?;

        let mut reports = docs
            .into_iter()
            .map(|doc| -> Result<StoredReport> {
                Ok(StoredReport {
                    id: doc.id,
                    document: serde_json::from_value(doc.body)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        reports.sort_by(|a, b| {
            b.document
                .timestamp
                .cmp(&a.document.timestamp)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(reports)
    }
}
