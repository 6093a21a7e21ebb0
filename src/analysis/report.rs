use crate::analysis::float;
use crate::analysis::metrics::AnalysisResult;
use crate::analysis::recommendations::known;
use serde::{Deserialize, Serialize};

const SAVINGS_SHARE: f64 = 0.2;
const COST_PER_UNIT_SAVED: f64 = 0.15;
const CARBON_PER_UNIT_SAVED: f64 = 0.5;

/// Summary numbers of an efficiency report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFigures {
    /// Percent; 0 when peak demand is unknown.
    #[serde(with = "float")]
    pub overall_efficiency: f64,
    #[serde(with = "float")]
    pub energy_savings: f64,
    #[serde(with = "float")]
    pub cost_savings: f64,
    #[serde(with = "float")]
    pub carbon_reduction: f64,
}

pub fn calculate(result: &AnalysisResult) -> ReportFigures {
    let energy_loss = result.basic_analysis.energy_loss;
    let peak_demand = result
        .advanced_analysis
        .as_ref()
        .and_then(|a| known(a.peak_demand));

    let overall_efficiency = match peak_demand {
        Some(peak) => (1.0 - energy_loss / peak) * 100.0,
        None => 0.0,
    };

    let energy_savings = round_half_up(energy_loss * SAVINGS_SHARE);

    ReportFigures {
        overall_efficiency,
        energy_savings,
        cost_savings: round_half_up(energy_savings * COST_PER_UNIT_SAVED),
        carbon_reduction: round_half_up(energy_savings * CARBON_PER_UNIT_SAVED),
    }
}

/// Halves round toward positive infinity, so -2.5 becomes -2.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
