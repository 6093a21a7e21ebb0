//! Record parser: turns an uploaded CSV or XLSX file into [`RawReading`]s.
//!
//! The whole file is rejected on the first problem; callers never see a
//! partial result.

use crate::analysis::reading::RawReading;
use calamine::{Data, Reader, Xlsx};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid CSV file: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid spreadsheet: {0}")]
    Xlsx(#[from] calamine::XlsxError),
    #[error("No sheets found in the workbook")]
    NoSheets,
    #[error("The uploaded file contains no data rows")]
    Empty,
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Row {row}: value '{value}' in column '{column}' is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("Row {row}: invalid timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xlsx,
}

impl UploadFormat {
    /// XLSX files are ZIP archives, so the signature wins over the file name.
    pub fn detect(file_name: &str, bytes: &[u8]) -> Self {
        if bytes.starts_with(b"PK\x03\x04") || file_name.to_ascii_lowercase().ends_with(".xlsx") {
            UploadFormat::Xlsx
        } else {
            UploadFormat::Csv
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => v.to_string(),
            Cell::DateTime(dt) => dt.to_string(),
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

struct Table {
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Column positions resolved from the header row.
struct Columns {
    timestamp: usize,
    feeder_name: usize,
    consumption: usize,
    voltage: usize,
    current: usize,
    active_power: Option<usize>,
    reactive_power: Option<usize>,
    power_factor: Option<usize>,
    thd: Option<usize>,
    carbon_intensity: Option<usize>,
}

impl Columns {
    fn locate(header: &[String]) -> Result<Self, ParseError> {
        let find = |name: &str| header.iter().position(|h| h == name);
        let require = |name: &'static str| find(name).ok_or(ParseError::MissingColumn(name));

        Ok(Self {
            timestamp: require("timestamp")?,
            feeder_name: require("feederName")?,
            consumption: require("consumption")?,
            voltage: require("voltage")?,
            current: require("current")?,
            active_power: find("activePower"),
            reactive_power: find("reactivePower"),
            power_factor: find("powerFactor"),
            thd: find("thd"),
            carbon_intensity: find("carbonIntensity"),
        })
    }
}

/// Parse one uploaded file. The format is detected from its content and name.
pub fn parse_upload(file_name: &str, bytes: &[u8]) -> Result<Vec<RawReading>, ParseError> {
    let format = UploadFormat::detect(file_name, bytes);
    debug!(file_name, ?format, size = bytes.len(), "parsing upload");

    let table = match format {
        UploadFormat::Csv => read_csv(bytes)?,
        UploadFormat::Xlsx => read_xlsx(bytes)?,
    };

    readings_from_table(table)
}

fn read_csv(bytes: &[u8]) -> Result<Table, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table { header, rows })
}

fn read_xlsx(bytes: &[u8]) -> Result<Table, ParseError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ParseError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(row) => row.iter().map(|cell| cell.to_string()).collect(),
        None => Vec::new(),
    };

    let rows = rows
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|row| row.iter().map(cell_from_xlsx).collect())
        .collect();

    Ok(Table { header, rows })
}

fn cell_from_xlsx(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::DateTime(naive),
            None => Cell::Number(dt.as_f64()),
        },
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        other => Cell::Text(other.to_string()),
    }
}

fn readings_from_table(table: Table) -> Result<Vec<RawReading>, ParseError> {
    if table.header.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::Empty);
    }

    let columns = Columns::locate(&table.header)?;

    if table.rows.is_empty() {
        return Err(ParseError::Empty);
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, cells)| read_row(&columns, i + 1, cells))
        .collect()
}

fn read_row(columns: &Columns, row: usize, cells: &[Cell]) -> Result<RawReading, ParseError> {
    let cell = |idx: usize| cells.get(idx).unwrap_or(&EMPTY_CELL);
    let number = |idx: Option<usize>, column: &'static str| match idx {
        Some(idx) => to_number(cell(idx), row, column),
        None => Ok(None),
    };

    Ok(RawReading {
        row,
        timestamp: to_timestamp(cell(columns.timestamp), row)?,
        feeder_name: match cell(columns.feeder_name) {
            Cell::Empty => None,
            other => Some(other.display()),
        },
        consumption: number(Some(columns.consumption), "consumption")?,
        voltage: number(Some(columns.voltage), "voltage")?,
        current: number(Some(columns.current), "current")?,
        active_power: number(columns.active_power, "activePower")?,
        reactive_power: number(columns.reactive_power, "reactivePower")?,
        power_factor: number(columns.power_factor, "powerFactor")?,
        thd: number(columns.thd, "thd")?,
        carbon_intensity: number(columns.carbon_intensity, "carbonIntensity")?,
    })
}

fn to_number(cell: &Cell, row: usize, column: &'static str) -> Result<Option<f64>, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        row,
        column,
        value: cell.display(),
    };

    let value = match cell {
        Cell::Empty => return Ok(None),
        Cell::Number(v) => *v,
        Cell::Text(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        Cell::DateTime(_) => return Err(invalid()),
    };

    if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(invalid())
    }
}

fn to_timestamp(cell: &Cell, row: usize) -> Result<DateTime<Utc>, ParseError> {
    let parsed = match cell {
        Cell::DateTime(naive) => Some(naive.and_utc()),
        Cell::Number(serial) => from_excel_serial(*serial),
        Cell::Text(s) => parse_timestamp(s.trim()),
        Cell::Empty => None,
    };

    parsed.ok_or_else(|| ParseError::InvalidTimestamp {
        row,
        value: cell.display(),
    })
}

/// Accepts RFC 3339 and the common spreadsheet layouts; naive values are UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Spreadsheet serial date: days since 1899-12-30, fraction is time of day.
fn from_excel_serial(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
        .map(|naive| naive.and_utc())
}
