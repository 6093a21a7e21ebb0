//! The analysis pipeline: parse, validate, group by feeder, compute metrics.
//!
//! Everything under this module is synchronous and free of I/O.

pub mod aggregator;
pub mod float;
pub mod metrics;
pub mod parser;
pub mod reading;
pub mod recommendations;
pub mod report;
pub mod validate;

pub use aggregator::{group_by_feeder, FeederGroup};
pub use metrics::{
    analyze, analyze_feeder, AdvancedAnalysis, AnalysisResult, BasicAnalysis, ConsumptionTrend,
    CostAnalysis,
};
pub use parser::{parse_upload, ParseError, UploadFormat};
pub use reading::{EnergyReading, RawReading};
pub use recommendations::generate_recommendations;
pub use report::{calculate, ReportFigures};
pub use validate::{validate, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Outcome of one pipeline run over an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub reading_count: usize,
    pub results: Vec<AnalysisResult>,
}

/// Runs one upload end to end. Fails before grouping when the file is
/// unreadable or incomplete, so callers never see partial results.
pub fn run_pipeline(file_name: &str, bytes: &[u8]) -> Result<PipelineOutput, PipelineError> {
    let raw = parse_upload(file_name, bytes)?;
    let readings = validate(raw)?;
    let reading_count = readings.len();

    let groups = group_by_feeder(readings);
    Ok(PipelineOutput {
        reading_count,
        results: analyze(&groups),
    })
}
