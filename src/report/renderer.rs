//! CSV rendering for power position reports.
//!
//! Format: a `Datetime;Volume` header, then one row per hourly volume with an
//! ISO-8601 UTC timestamp and the volume at two decimals. Rows are joined by
//! `\n` with no trailing newline.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::HourlyVolume;

pub const HEADER: &str = "Datetime;Volume";
pub const SEPARATOR: char = ';';
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const FILE_PREFIX: &str = "PowerPosition";
const FILE_DATE_FORMAT: &str = "%Y%m%d";
const FILE_STAMP_FORMAT: &str = "%Y%m%d%H%M";

/// A line that could not be read back.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing 'Datetime;Volume' header")]
    MissingHeader,
    #[error("line {line}: expected '<timestamp>;<volume>', got '{content}'")]
    Malformed { line: usize, content: String },
    #[error("line {line}: bad timestamp '{value}'")]
    Timestamp { line: usize, value: String },
    #[error("line {line}: bad volume '{value}'")]
    Volume { line: usize, value: String },
}

/// Two decimals, midpoint away from zero.
pub fn format_volume(volume: Decimal) -> String {
    let rounded = volume.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // -0.004 would otherwise print as "-0.00"
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    format!("{rounded:.2}")
}

/// Render rows in ascending period order.
pub fn render_content(volumes: &[HourlyVolume]) -> String {
    let mut ordered: Vec<&HourlyVolume> = volumes.iter().collect();
    ordered.sort_by_key(|v| v.period);

    let mut lines = Vec::with_capacity(ordered.len() + 1);
    lines.push(HEADER.to_string());
    lines.extend(ordered.into_iter().map(|v| {
        format!(
            "{}{SEPARATOR}{}",
            v.timestamp_utc.format(TIMESTAMP_FORMAT),
            format_volume(v.total_volume)
        )
    }));
    lines.join("\n")
}

/// `PowerPosition_<delivery yyyyMMdd>_<generated yyyyMMddHHmm>.csv`, with the
/// generation stamp taken in UTC.
pub fn render_file_name(delivery_date: NaiveDate, generated_at: DateTime<Utc>) -> String {
    format!(
        "{FILE_PREFIX}_{}_{}.csv",
        delivery_date.format(FILE_DATE_FORMAT),
        generated_at.format(FILE_STAMP_FORMAT)
    )
}

/// File name and content in one call.
pub fn render(
    volumes: &[HourlyVolume],
    delivery_date: NaiveDate,
    generated_at: DateTime<Utc>,
) -> (String, String) {
    (
        render_file_name(delivery_date, generated_at),
        render_content(volumes),
    )
}

/// Read a rendered report back into `(timestamp, volume)` rows.
pub fn parse_content(content: &str) -> Result<Vec<(DateTime<Utc>, Decimal)>, ParseError> {
    let mut lines = content.split('\n');
    if lines.next() != Some(HEADER) {
        return Err(ParseError::MissingHeader);
    }

    lines
        .enumerate()
        .map(|(idx, raw)| {
            let line = idx + 2;
            let (ts, volume) = raw.split_once(SEPARATOR).ok_or_else(|| ParseError::Malformed {
                line,
                content: raw.to_string(),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
                .map_err(|_| ParseError::Timestamp {
                    line,
                    value: ts.to_string(),
                })?
                .and_utc();
            let volume = Decimal::from_str(volume).map_err(|_| ParseError::Volume {
                line,
                value: volume.to_string(),
            })?;
            Ok((timestamp, volume))
        })
        .collect()
}
