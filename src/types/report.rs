//! Report-side types: aggregated hourly rows, rendered files, cycle summaries.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Aggregated volume for one hourly period of the delivery day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlyVolume {
    /// 1-based period index the row was aggregated from
    pub period: u8,
    /// Start of the hour as an absolute instant
    pub timestamp_utc: DateTime<Utc>,
    /// Exact sum of every trade's volume for this period
    pub total_volume: Decimal,
}

/// A rendered report ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub file_name: String,
    pub content: String,
    pub destination: PathBuf,
}

/// Summary of a successfully completed report cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub delivery_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub destination: PathBuf,
    pub trade_count: usize,
    pub row_count: usize,
    /// Number of calls made to the trading source, including the successful one
    pub fetch_attempts: u32,
}
