//! Turns one feeder's metrics into ordered, human-readable advice.
//!
//! Rules run in a fixed order and only append. A metric that is absent, zero
//! or NaN does not trigger its rule.

use crate::analysis::metrics::{AdvancedAnalysis, AnalysisResult, ConsumptionTrend};

const INCREASING_TREND: [&str; 3] = [
    "Implement energy-saving measures to reverse the increasing consumption trend.",
    "Conduct a detailed energy audit to identify areas of high consumption.",
    "Consider upgrading to more energy-efficient equipment.",
];

const STABLE_TREND: [&str; 2] = [
    "Set new energy reduction goals to drive continuous improvement.",
    "Explore innovative energy-saving technologies to further reduce consumption.",
];

const POOR_LOAD_FACTOR: [&str; 2] = [
    "Significantly improve load factor by balancing energy consumption throughout the day.",
    "Consider energy storage solutions to flatten consumption peaks.",
];

const FAIR_LOAD_FACTOR: &str =
    "Improve load factor by shifting non-essential operations to off-peak hours.";

const POOR_POWER_FACTOR: &str =
    "Install power factor correction equipment to significantly improve overall efficiency.";

const FAIR_POWER_FACTOR: &str =
    "Consider additional power factor correction measures for optimal efficiency.";

const HIGH_THD: &str =
    "Implement harmonic filters to reduce Total Harmonic Distortion and improve power quality.";

const VOLTAGE_INSTABILITY: &str =
    "Investigate and address causes of voltage instability to improve overall system efficiency.";

const LOW_EFFICIENCY: [&str; 2] = [
    "Implement a comprehensive energy management system to track and improve energy efficiency.",
    "Consider retro-commissioning of building systems to optimize performance.",
];

const CARBON: [&str; 2] = [
    "Explore renewable energy options to reduce carbon emissions and long-term energy costs.",
    "Implement a carbon reduction strategy aligned with industry best practices.",
];

const PEAK_SHAVING: &str =
    "Implement peak shaving strategies to reduce high-cost energy consumption during peak hours.";

const PROCUREMENT_REVIEW: &str =
    "Regularly review and optimize energy procurement contracts to ensure best rates.";

const REACTIVE_COMPENSATION: &str =
    "Implement reactive power compensation to reduce energy losses and improve system efficiency.";

const CLOSING: [&str; 3] = [
    "Conduct regular energy awareness training for staff to promote energy-saving behaviors.",
    "Consider ISO 50001 certification to formalize your energy management practices.",
    "Explore government incentives and rebates for energy efficiency improvements.",
];

/// Never empty: the closing advice is always appended.
pub fn generate_recommendations(result: &AnalysisResult) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();

    match result.basic_analysis.consumption_trend {
        ConsumptionTrend::Increasing => out.extend(INCREASING_TREND),
        ConsumptionTrend::Stable => out.extend(STABLE_TREND),
        ConsumptionTrend::Decreasing => {}
    }

    if let Some(advanced) = &result.advanced_analysis {
        advanced_rules(advanced, &mut out);
    }

    out.extend(CLOSING);
    out.into_iter().map(String::from).collect()
}

fn advanced_rules(advanced: &AdvancedAnalysis, out: &mut Vec<&'static str>) {
    if let Some(load_factor) = known(advanced.load_factor) {
        if load_factor < 0.5 {
            out.extend(POOR_LOAD_FACTOR);
        } else if load_factor < 0.7 {
            out.push(FAIR_LOAD_FACTOR);
        }
    }

    if let Some(power_factor) = known(advanced.average_power_factor) {
        if power_factor < 0.85 {
            out.push(POOR_POWER_FACTOR);
        } else if power_factor < 0.95 {
            out.push(FAIR_POWER_FACTOR);
        }
    }

    if known(advanced.average_thd).is_some_and(|thd| thd > 5.0) {
        out.push(HIGH_THD);
    }

    if known(advanced.voltage_stability).is_some_and(|v| v < 0.95) {
        out.push(VOLTAGE_INSTABILITY);
    }

    if known(advanced.energy_efficiency).is_some_and(|e| e < 0.8) {
        out.extend(LOW_EFFICIENCY);
    }

    if known(advanced.carbon_emissions).is_some() {
        out.extend(CARBON);
    }

    if let Some(cost) = &advanced.cost_analysis {
        if known(cost.peak_cost).is_some_and(|peak| peak > cost.total_cost * 0.3) {
            out.push(PEAK_SHAVING);
        }
        out.push(PROCUREMENT_REVIEW);
    }

    if known(advanced.reactive_power_percentage).is_some_and(|p| p > 10.0) {
        out.push(REACTIVE_COMPENSATION);
    }
}

/// A metric counts only when present, non-zero and not NaN.
pub(crate) fn known(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}
