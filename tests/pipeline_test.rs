// End-to-end runs of the analysis pipeline against the in-memory store

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use energy_analysis_api::analysis::{self, ConsumptionTrend};
use energy_analysis_api::context::{FixedClock, RequestContext};
use energy_analysis_api::error::AppError;
use energy_analysis_api::repositories::{DocumentStore, MemoryDocumentStore};
use energy_analysis_api::services::AnalysisService;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const FIXTURE: &[u8] = include_bytes!("fixtures/readings.csv");

fn ctx(user: &str) -> RequestContext {
    let now = Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap();
    RequestContext::new(user, &FixedClock(now))
}

#[test]
fn test_fixture_metrics() {
    let out = analysis::run_pipeline("readings.csv", FIXTURE).unwrap();

    assert_eq!(out.reading_count, 7);
    assert_eq!(out.results.len(), 2);

    let a = &out.results[0];
    assert_eq!(a.feeder_name, "Feeder A");
    assert_eq!(a.basic_analysis.consumption_trend, ConsumptionTrend::Increasing);
    assert_relative_eq!(a.basic_analysis.energy_loss, 30.0, epsilon = 1e-9);
    assert_relative_eq!(a.basic_analysis.profitability, 1.0 / 3.0, epsilon = 1e-9);

    let advanced = a.advanced_analysis.unwrap();
    assert_eq!(advanced.peak_demand, Some(20.0));
    assert_relative_eq!(advanced.load_factor.unwrap(), 0.75);
    assert_relative_eq!(advanced.average_thd.unwrap(), 6.125, epsilon = 1e-9);
    assert!(advanced.carbon_emissions.is_some());
    assert!(advanced.reactive_power_percentage.unwrap() > 10.0);

    let b = &out.results[1];
    assert_eq!(b.feeder_name, "Feeder B");
    let advanced = b.advanced_analysis.unwrap();
    assert_eq!(advanced.peak_demand, None);
    assert_eq!(advanced.load_factor, None);
    assert_eq!(advanced.average_thd, None);
    assert_eq!(advanced.carbon_emissions, None);
    assert!(advanced.average_power_factor.is_some());
    assert!(advanced.cost_analysis.unwrap().peak_cost.is_none());
}

#[test]
fn test_fixture_recommendations_and_report() {
    let out = analysis::run_pipeline("readings.csv", FIXTURE).unwrap();
    let a = &out.results[0];

    let recommendations = analysis::generate_recommendations(a);
    assert_eq!(recommendations.len(), 13);
    assert_eq!(
        recommendations.last().unwrap(),
        "Explore government incentives and rebates for energy efficiency improvements."
    );
    assert!(recommendations.contains(
        &"Implement peak shaving strategies to reduce high-cost energy consumption during peak hours."
            .to_string()
    ));

    let figures = analysis::calculate(a);
    assert_relative_eq!(figures.overall_efficiency, -50.0, epsilon = 1e-9);
    assert_eq!(figures.energy_savings, 6.0);
    assert_eq!(figures.cost_savings, 1.0);
    assert_eq!(figures.carbon_reduction, 3.0);
}

#[tokio::test]
async fn test_upload_report_roundtrip_through_store() {
    let store = Arc::new(MemoryDocumentStore::new());
    let service = AnalysisService::new(store.clone());
    let alice = ctx("alice");

    let stored = service
        .analyze_upload(&alice, "readings.csv", FIXTURE)
        .await
        .unwrap();
    let raw = store.get("energyAnalysis", &stored.id).await.unwrap().unwrap();
    assert_eq!(raw.body["fileName"], "readings.csv");
    assert_eq!(raw.body["uploadedBy"], "alice");
    assert_eq!(raw.body["results"][1]["feederName"], "Feeder B");

    let user = store.get("users", "alice").await.unwrap().unwrap();
    assert_eq!(user.body["latestAnalysisId"], stored.id.as_str());

    let report = service
        .generate_report(&alice, &stored.id, "Feeder B")
        .await
        .unwrap();
    let raw = store.get("efficiencyReports", &report.id).await.unwrap().unwrap();
    assert_eq!(raw.body["userId"], "alice");
    assert_eq!(raw.body["analysisId"], stored.id.as_str());
    assert_eq!(raw.body["overallEfficiency"], 0.0);
    assert!(raw.body["recommendations"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn test_nan_metrics_survive_the_store() {
    let service = AnalysisService::new(Arc::new(MemoryDocumentStore::new()));
    let alice = ctx("alice");
    let csv = "timestamp,feederName,consumption,voltage,current\n\
               2024-01-01T00:00:00Z,Zero,0,230,1\n";

    let stored = service
        .analyze_upload(&alice, "zero.csv", csv.as_bytes())
        .await
        .unwrap();

    let loaded = service.get_analysis(&stored.id).await.unwrap();
    assert!(loaded.document.results[0].basic_analysis.profitability.is_nan());
}

#[tokio::test]
async fn test_incomplete_upload_persists_nothing() {
    let store = Arc::new(MemoryDocumentStore::new());
    let service = AnalysisService::new(store.clone());
    let csv = "timestamp,feederName,consumption,voltage,current\n\
               2024-01-01T00:00:00Z,F1,10,230,1\n\
               2024-01-01T01:00:00Z,F1,12,,1\n";

    let err = service
        .analyze_upload(&ctx("alice"), "bad.csv", csv.as_bytes())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(store.get("users", "alice").await.unwrap().is_none());
}
