use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One data row exactly as the parser read it. Required measurements are
/// still optional here; `validate` decides whether the upload is usable.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// 1-based row number in the uploaded sheet, header excluded.
    pub row: usize,
    pub timestamp: DateTime<Utc>,
    pub feeder_name: Option<String>,
    pub consumption: Option<f64>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub active_power: Option<f64>,
    pub reactive_power: Option<f64>,
    pub power_factor: Option<f64>,
    pub thd: Option<f64>,
    pub carbon_intensity: Option<f64>,
}

/// A validated meter reading. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyReading {
    pub timestamp: DateTime<Utc>,
    pub feeder_name: String,
    pub consumption: f64,
    pub voltage: f64,
    pub current: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactive_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_intensity: Option<f64>,
}

impl EnergyReading {
    /// Reading with only the mandatory columns filled in.
    pub fn new(
        timestamp: DateTime<Utc>,
        feeder_name: impl Into<String>,
        consumption: f64,
        voltage: f64,
        current: f64,
    ) -> Self {
        Self {
            timestamp,
            feeder_name: feeder_name.into(),
            consumption,
            voltage,
            current,
            active_power: None,
            reactive_power: None,
            power_factor: None,
            thd: None,
            carbon_intensity: None,
        }
    }
}
