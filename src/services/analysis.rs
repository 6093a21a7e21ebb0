use crate::analysis::{self, AnalysisResult, ReportFigures};
use crate::context::RequestContext;
use crate::error::{AppError, Result};
use crate::repositories::{
    AnalysisDocument, AnalysisRepository, DocumentStore, EfficiencyReportDocument,
    ReportRepository, StoredAnalysis, StoredReport, UserRepository,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Recommendations and figures for one feeder, not yet stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPreview {
    pub analysis_id: String,
    pub feeder_name: String,
    #[serde(flatten)]
    pub figures: ReportFigures,
    pub recommendations: Vec<String>,
}

#[derive(Clone)]
pub struct AnalysisService {
    analyses: AnalysisRepository,
    reports: ReportRepository,
    users: UserRepository,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            analyses: AnalysisRepository::new(store.clone()),
            reports: ReportRepository::new(store.clone()),
            users: UserRepository::new(store),
        }
    }

    /// Parses and analyses an upload, then stores the results. Nothing is
    /// written unless the whole file is usable.
    pub async fn analyze_upload(
        &self,
        ctx: &RequestContext,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredAnalysis> {
        let output = analysis::run_pipeline(file_name, bytes)?;
        info!(
            file_name,
            readings = output.reading_count,
            feeders = output.results.len(),
            "Upload analysed"
        );
        for result in &output.results {
            debug!(
                feeder = %result.feeder_name,
                trend = %result.basic_analysis.consumption_trend,
                advanced = result.advanced_analysis.is_some(),
                "Feeder analysed"
            );
        }

        let document = AnalysisDocument {
            file_name: file_name.to_string(),
            uploaded_by: ctx.user_id.clone(),
            timestamp: ctx.now,
            results: output.results,
        };
        let id = self.analyses.insert(&document).await?;
        self.users.set_latest_analysis(&ctx.user_id, &id).await?;
        info!(analysis_id = %id, user = %ctx.user_id, "Analysis stored");

        Ok(StoredAnalysis { id, document })
    }

    pub async fn get_analysis(&self, id: &str) -> Result<StoredAnalysis> {
        self.analyses
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Analysis {} not found", id)))
    }

    pub async fn latest_analysis(&self, ctx: &RequestContext) -> Result<StoredAnalysis> {
        let id = self
            .users
            .latest_analysis_id(&ctx.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No analysis uploaded yet".into()))?;

        self.get_analysis(&id).await
    }

    pub async fn preview(&self, analysis_id: &str, feeder_name: &str) -> Result<ReportPreview> {
        let analysis = self.get_analysis(analysis_id).await?;
        let result = feeder_result(&analysis, feeder_name)?;

        Ok(ReportPreview {
            analysis_id: analysis.id.clone(),
            feeder_name: result.feeder_name.clone(),
            figures: analysis::calculate(result),
            recommendations: analysis::generate_recommendations(result),
        })
    }

    pub async fn generate_report(
        &self,
        ctx: &RequestContext,
        analysis_id: &str,
        feeder_name: &str,
    ) -> Result<StoredReport> {
        let preview = self.preview(analysis_id, feeder_name).await?;

        let document = EfficiencyReportDocument {
            user_id: ctx.user_id.clone(),
            timestamp: ctx.now,
            overall_efficiency: preview.figures.overall_efficiency,
            energy_savings: preview.figures.energy_savings,
            cost_savings: preview.figures.cost_savings,
            carbon_reduction: preview.figures.carbon_reduction,
            recommendations: preview.recommendations,
            analysis_id: preview.analysis_id,
            feeder_name: preview.feeder_name,
        };
        let id = self.reports.insert(&document).await?;
        info!(report_id = %id, analysis_id, feeder = %document.feeder_name, "Report stored");

        Ok(StoredReport { id, document })
    }

    pub async fn list_reports(&self, ctx: &RequestContext) -> Result<Vec<StoredReport>> {
        self.reports.list_for_user(&ctx.user_id).await
    }

    /// Reports belonging to someone else look the same as missing ones.
    pub async fn get_report(&self, ctx: &RequestContext, id: &str) -> Result<StoredReport> {
        self.reports
            .get(id)
            .await?
            .filter(|r| r.document.user_id == ctx.user_id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }
}

fn feeder_result<'a>(analysis: &'a StoredAnalysis, feeder_name: &str) -> Result<&'a AnalysisResult> {
    analysis.document.result_for(feeder_name).ok_or_else(|| {
        AppError::NotFound(format!(
            "Feeder {} not found in analysis {}",
            feeder_name, analysis.id
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FixedClock;
    use crate::repositories::MemoryDocumentStore;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    const CSV: &str = "timestamp,feederName,consumption,voltage,current,activePower\n\
                       2024-01-01T00:00:00Z,F1,100,230,5,10\n\
                       2024-01-01T01:00:00Z,F1,100,230,5,10\n\
                       2024-01-01T02:00:00Z,F1,200,230,5,20\n\
                       2024-01-01T03:00:00Z,F1,200,230,5,20\n";

    fn service() -> AnalysisService {
        AnalysisService::new(Arc::new(MemoryDocumentStore::new()))
    }

    fn ctx(user: &str, minute: i64) -> RequestContext {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        RequestContext::new(user, &FixedClock(base + Duration::minutes(minute)))
    }

    #[tokio::test]
    async fn test_upload_is_stored_and_becomes_latest() {
        let service = service();
        let alice = ctx("alice", 0);

        let stored = service
            .analyze_upload(&alice, "readings.csv", CSV.as_bytes())
            .await
            .unwrap();

        assert_eq!(stored.document.uploaded_by, "alice");
        assert_eq!(stored.document.timestamp, alice.now);
        assert_eq!(service.get_analysis(&stored.id).await.unwrap(), stored);
        assert_eq!(service.latest_analysis(&alice).await.unwrap().id, stored.id);
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let service = service();
        let alice = ctx("alice", 0);

        let err = service
            .analyze_upload(&alice, "readings.csv", b"timestamp,feederName\n2024-01-01,F1\n")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Parse(_)));
        assert!(matches!(
            service.latest_analysis(&alice).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_report_generation_and_ownership() {
        let service = service();
        let alice = ctx("alice", 0);
        let stored = service
            .analyze_upload(&alice, "readings.csv", CSV.as_bytes())
            .await
            .unwrap();

        let report = service
            .generate_report(&ctx("alice", 5), &stored.id, "F1")
            .await
            .unwrap();

        // energyLoss 30, peak demand 20
        assert_eq!(report.document.overall_efficiency, -50.0);
        assert_eq!(report.document.energy_savings, 6.0);
        assert_eq!(report.document.feeder_name, "F1");
        assert_eq!(report.document.analysis_id, stored.id);
        assert_eq!(
            report.document.recommendations[0],
            "Implement energy-saving measures to reverse the increasing consumption trend."
        );

        assert_eq!(service.get_report(&alice, &report.id).await.unwrap(), report);
        assert!(matches!(
            service.get_report(&ctx("bob", 0), &report.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reports_listed_newest_first() {
        let service = service();
        let alice = ctx("alice", 0);
        let stored = service
            .analyze_upload(&alice, "readings.csv", CSV.as_bytes())
            .await
            .unwrap();

        let older = service.generate_report(&ctx("alice", 1), &stored.id, "F1").await.unwrap();
        let newer = service.generate_report(&ctx("alice", 2), &stored.id, "F1").await.unwrap();
        service.generate_report(&ctx("bob", 3), &stored.id, "F1").await.unwrap();

        let ids: Vec<String> = service
            .list_reports(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_stored_report_matches_preview() {
        let service = service();
        let alice = ctx("alice", 0);
        let stored = service
            .analyze_upload(&alice, "readings.csv", CSV.as_bytes())
            .await
            .unwrap();

        let preview = service.preview(&stored.id, "F1").await.unwrap();
        let report = service.generate_report(&alice, &stored.id, "F1").await.unwrap();

        let figures = ReportFigures {
            overall_efficiency: report.document.overall_efficiency,
            energy_savings: report.document.energy_savings,
            cost_savings: report.document.cost_savings,
            carbon_reduction: report.document.carbon_reduction,
        };
        assert_eq!(figures, preview.figures);
        assert_eq!(report.document.recommendations, preview.recommendations);
        assert_eq!(report.document.feeder_name, preview.feeder_name);
    }

    #[tokio::test]
    async fn test_unknown_feeder_is_not_found() {
        let service = service();
        let alice = ctx("alice", 0);
        let stored = service
            .analyze_upload(&alice, "readings.csv", CSV.as_bytes())
            .await
            .unwrap();

        assert!(matches!(
            service.preview(&stored.id, "F9").await,
            Err(AppError::NotFound(_))
        ));
    }
}
