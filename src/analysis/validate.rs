use crate::analysis::reading::{EnergyReading, RawReading};
use thiserror::Error;

const MAX_REPORTED_ROWS: usize = 10;

/// Raised when a parsed upload lacks the measurements every analysis needs.
#[derive(Debug, Error)]
#[error("Insufficient data for analysis. Please ensure feederName, consumption, voltage, and current are provided for all entries (rows: {})", format_rows(.rows))]
pub struct ValidationError {
    pub rows: Vec<usize>,
}

fn format_rows(rows: &[usize]) -> String {
    let mut listed: Vec<String> = rows
        .iter()
        .take(MAX_REPORTED_ROWS)
        .map(|r| r.to_string())
        .collect();
    if rows.len() > MAX_REPORTED_ROWS {
        listed.push(format!("and {} more", rows.len() - MAX_REPORTED_ROWS));
    }
    listed.join(", ")
}

/// All-or-nothing: one incomplete row rejects the upload.
pub fn validate(raw: Vec<RawReading>) -> Result<Vec<EnergyReading>, ValidationError> {
    let incomplete: Vec<usize> = raw
        .iter()
        .filter(|r| {
            r.feeder_name.is_none()
                || r.consumption.is_none()
                || r.voltage.is_none()
                || r.current.is_none()
        })
        .map(|r| r.row)
        .collect();

    if !incomplete.is_empty() {
        return Err(ValidationError { rows: incomplete });
    }

    Ok(raw
        .into_iter()
        .filter_map(|r| {
            Some(EnergyReading {
                timestamp: r.timestamp,
                feeder_name: r.feeder_name?,
                consumption: r.consumption?,
                voltage: r.voltage?,
                current: r.current?,
                active_power: r.active_power,
                reactive_power: r.reactive_power,
                power_factor: r.power_factor,
                thd: r.thd,
                carbon_intensity: r.carbon_intensity,
            })
        })
        .collect())
}
