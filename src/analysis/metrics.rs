//! Per-feeder metrics.
//!
//! Every advanced metric is gated on its source field being present on *every*
//! reading of the group. Nothing here fails: empty sums and zero denominators
//! flow through as NaN or infinity and are stored as such.

use crate::analysis::aggregator::FeederGroup;
use crate::analysis::float;
use crate::analysis::reading::EnergyReading;
use serde::{Deserialize, Serialize};

/// Revenue per unit of consumption.
pub const REVENUE_RATE: f64 = 0.20;
/// Cost per unit of consumption.
pub const COST_RATE: f64 = 0.15;
/// Flat share of consumption assumed lost on the line.
pub const LOSS_RATE: f64 = 0.05;
/// Demand charge per unit of peak demand.
pub const PEAK_DEMAND_RATE: f64 = 10.0;
pub const OFF_PEAK_RATE: f64 = 0.10;
/// Fixed until a renewable share is provided with the data.
pub const RENEWABLE_PERCENTAGE: f64 = 20.0;

const TREND_UPPER: f64 = 1.1;
const TREND_LOWER: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for ConsumptionTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConsumptionTrend::Increasing => "increasing",
            ConsumptionTrend::Decreasing => "decreasing",
            ConsumptionTrend::Stable => "stable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAnalysis {
    #[serde(with = "float")]
    pub profitability: f64,
    #[serde(with = "float")]
    pub energy_loss: f64,
    pub consumption_trend: ConsumptionTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostAnalysis {
    #[serde(with = "float")]
    pub total_cost: f64,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub peak_cost: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub off_peak_cost: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedAnalysis {
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub peak_demand: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub load_factor: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub average_power_factor: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub average_thd: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub voltage_stability: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub energy_efficiency: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub carbon_emissions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_analysis: Option<CostAnalysis>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub reactive_power_percentage: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub estimated_linelosses: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub renewable_percentage: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub demand_response_potential: Option<f64>,
    #[serde(with = "float::option", default, skip_serializing_if = "Option::is_none")]
    pub forecasted_demand: Option<f64>,
}

impl AdvancedAnalysis {
    pub fn is_empty(&self) -> bool {
        *self == AdvancedAnalysis::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub feeder_name: String,
    pub basic_analysis: BasicAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_analysis: Option<AdvancedAnalysis>,
}

/// Demand figures derived from `activePower`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Demand {
    peak: f64,
    average: f64,
    total: f64,
}

pub fn analyze(groups: &[FeederGroup]) -> Vec<AnalysisResult> {
    groups
        .iter()
        .map(|g| analyze_feeder(&g.feeder_name, &g.readings))
        .collect()
}

/// Expects `readings` sorted by timestamp, as produced by the aggregator.
pub fn analyze_feeder(feeder_name: &str, readings: &[EnergyReading]) -> AnalysisResult {
    let total_consumption = sum(readings.iter().map(|r| r.consumption));

    let advanced = advanced_analysis(readings, total_consumption);

    AnalysisResult {
        feeder_name: feeder_name.to_string(),
        basic_analysis: basic_analysis(readings, total_consumption),
        advanced_analysis: (!advanced.is_empty()).then_some(advanced),
    }
}

fn basic_analysis(readings: &[EnergyReading], total_consumption: f64) -> BasicAnalysis {
    BasicAnalysis {
        profitability: profitability(total_consumption),
        energy_loss: total_consumption * LOSS_RATE,
        consumption_trend: consumption_trend(readings),
    }
}

/// Margin over cost. Left unsimplified so a zero total yields NaN.
pub fn profitability(total_consumption: f64) -> f64 {
    let revenue = total_consumption * REVENUE_RATE;
    let cost = total_consumption * COST_RATE;
    (revenue - cost) / cost
}

/// Compares the consumption of the later half of the series against the
/// earlier half. For odd lengths the middle reading counts toward the later
/// half. Fewer than two readings carry no trend.
pub fn consumption_trend(readings: &[EnergyReading]) -> ConsumptionTrend {
    if readings.len() < 2 {
        return ConsumptionTrend::Stable;
    }

    let (first, second) = readings.split_at(readings.len() / 2);
    let first = sum(first.iter().map(|r| r.consumption));
    let second = sum(second.iter().map(|r| r.consumption));

    if second > first * TREND_UPPER {
        ConsumptionTrend::Increasing
    } else if second < first * TREND_LOWER {
        ConsumptionTrend::Decreasing
    } else {
        ConsumptionTrend::Stable
    }
}

fn advanced_analysis(readings: &[EnergyReading], total_consumption: f64) -> AdvancedAnalysis {
    if readings.is_empty() {
        return AdvancedAnalysis::default();
    }

    let count = readings.len() as f64;
    let demand = complete(readings, |r| r.active_power).map(|power| demand(&power));

    AdvancedAnalysis {
        peak_demand: demand.map(|d| d.peak),
        load_factor: demand.map(|d| d.average / d.peak),
        average_power_factor: complete(readings, |r| r.power_factor).map(|v| mean(&v)),
        average_thd: complete(readings, |r| r.thd).map(|v| mean(&v)),
        voltage_stability: Some(voltage_stability(readings)),
        energy_efficiency: demand.map(|d| total_consumption / (d.total * count)),
        carbon_emissions: complete(readings, |r| r.carbon_intensity)
            .map(|intensity| carbon_emissions(readings, &intensity)),
        cost_analysis: Some(cost_analysis(total_consumption, demand)),
        reactive_power_percentage: complete(readings, |r| r.reactive_power)
            .map(|reactive| reactive_power_percentage(total_consumption, sum(reactive))),
        estimated_linelosses: Some(total_consumption * LOSS_RATE),
        renewable_percentage: Some(RENEWABLE_PERCENTAGE),
        demand_response_potential: demand.map(|d| d.peak * 0.15),
        forecasted_demand: demand.map(|d| d.average * 1.05),
    }
}

fn demand(power: &[f64]) -> Demand {
    Demand {
        peak: max(power),
        average: mean(power),
        total: sum(power.iter().copied()),
    }
}

/// 1 minus the voltage spread relative to the mean voltage.
fn voltage_stability(readings: &[EnergyReading]) -> f64 {
    let voltages: Vec<f64> = readings.iter().map(|r| r.voltage).collect();
    1.0 - (max(&voltages) - min(&voltages)) / mean(&voltages)
}

/// Consumption weighted by carbon intensity, per thousand units.
fn carbon_emissions(readings: &[EnergyReading], intensity: &[f64]) -> f64 {
    sum(readings
        .iter()
        .zip(intensity)
        .map(|(r, ci)| r.consumption * ci))
        / 1000.0
}

fn cost_analysis(total_consumption: f64, demand: Option<Demand>) -> CostAnalysis {
    CostAnalysis {
        total_cost: total_consumption * COST_RATE,
        peak_cost: demand.map(|d| d.peak * PEAK_DEMAND_RATE),
        off_peak_cost: demand.map(|d| (total_consumption - d.peak) * OFF_PEAK_RATE),
    }
}

/// Share of reactive power in the apparent power, consumption standing in
/// for real power.
fn reactive_power_percentage(total_consumption: f64, total_reactive: f64) -> f64 {
    let apparent = (total_consumption.powi(2) + total_reactive.powi(2)).sqrt();
    total_reactive / apparent * 100.0
}

/// Values of `field` when every reading has one.
fn complete<F>(readings: &[EnergyReading], field: F) -> Option<Vec<f64>>
where
    F: Fn(&EnergyReading) -> Option<f64>,
{
    readings.iter().map(field).collect()
}

fn sum(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, |acc, v| acc + v)
}

fn mean(values: &[f64]) -> f64 {
    sum(values.iter().copied()) / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}
