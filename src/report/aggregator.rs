//! Hourly position aggregation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use tracing::warn;

use super::delivery::period_start_utc;
use crate::types::{HourlyVolume, PowerTrade};

/// Sum trade volumes per period and stamp each period with its UTC start.
///
/// Output is ordered by period and contains only periods that appear in at
/// least one trade. Period indices outside 1-24 are dropped with a warning.
/// The result does not depend on the order of `trades` or of their periods.
pub fn aggregate(trades: &[PowerTrade], delivery_date: NaiveDate, tz: Tz) -> Vec<HourlyVolume> {
    let mut totals: BTreeMap<u8, Decimal> = BTreeMap::new();

    for trade in trades {
        for period in &trade.periods {
            if !period.is_valid() {
                warn!(
                    period = period.period,
                    delivery_date = %delivery_date,
                    "[Aggregator] Dropping period outside 1-24"
                );
                continue;
            }
            *totals.entry(period.period).or_insert(Decimal::ZERO) += period.volume;
        }
    }

    totals
        .into_iter()
        .map(|(period, total_volume)| HourlyVolume {
            period,
            timestamp_utc: period_start_utc(delivery_date, period, tz),
            total_volume,
        })
        .collect()
}
