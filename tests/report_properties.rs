//! Property-based tests for aggregation and CSV rendering
//!
//! Invariants checked for arbitrary trade sets:
//! 1. Exact sums: one row per period present, total equals the plain sum
//! 2. Order independence: shuffling trades or splitting them per period
//!    changes nothing
//! 3. Rendering: header plus one line per row
//! 4. Round trip: parsed rows equal (timestamp, volume rounded to 2 dp)

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use power_position::report::{aggregate, parse_content, period_start_utc, render_content};
use power_position::types::{HourlyVolume, PowerPeriod, PowerTrade};
use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};

// ============================================================================
// Strategies
// ============================================================================

/// Signed volumes with up to four decimals, so rounding midpoints show up.
fn volume() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..=10_000_000i64, 0u32..=4).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn power_period() -> impl Strategy<Value = PowerPeriod> {
    (1u8..=24, volume()).prop_map(|(period, volume)| PowerPeriod::new(period, volume))
}

/// Any day in 2024-2025, DST transitions included.
fn delivery_day() -> impl Strategy<Value = NaiveDate> {
    (0u64..731).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.checked_add_days(Days::new(offset)))
            .unwrap_or(NaiveDate::MIN)
    })
}

fn zone() -> impl Strategy<Value = Tz> {
    prop::sample::select(vec![
        chrono_tz::Europe::Berlin,
        chrono_tz::Europe::London,
        chrono_tz::America::Sao_Paulo,
        chrono_tz::UTC,
    ])
}

fn trades_for(day: NaiveDate) -> impl Strategy<Value = Vec<PowerTrade>> {
    prop::collection::vec(
        prop::collection::vec(power_period(), 0..=30)
            .prop_map(move |periods| PowerTrade::new(day, periods)),
        0..=12,
    )
}

/// A trade set together with a shuffled copy of it.
fn trades_and_shuffled() -> impl Strategy<Value = (NaiveDate, Tz, Vec<PowerTrade>, Vec<PowerTrade>)> {
    (delivery_day(), zone()).prop_flat_map(|(day, tz)| {
        trades_for(day).prop_flat_map(move |trades| {
            (
                Just(day),
                Just(tz),
                Just(trades.clone()),
                Just(trades).prop_shuffle(),
            )
        })
    })
}

/// Rows for a random subset of periods, as the aggregator would produce them.
fn hourly_rows() -> impl Strategy<Value = Vec<HourlyVolume>> {
    (
        delivery_day(),
        zone(),
        prop::sample::subsequence((1u8..=24).collect::<Vec<_>>(), 0..=24),
    )
        .prop_flat_map(|(day, tz, periods)| {
            let n = periods.len();
            prop::collection::vec(volume(), n).prop_map(move |volumes| {
                periods
                    .iter()
                    .zip(volumes)
                    .map(|(&period, total_volume)| HourlyVolume {
                        period,
                        timestamp_utc: period_start_utc(day, period, tz),
                        total_volume,
                    })
                    .collect()
            })
        })
}

fn plain_sums(trades: &[PowerTrade]) -> BTreeMap<u8, Decimal> {
    let mut sums = BTreeMap::new();
    for period in trades.iter().flat_map(|t| &t.periods) {
        *sums.entry(period.period).or_insert(Decimal::ZERO) += period.volume;
    }
    sums
}

fn two_dp(volume: Decimal) -> Decimal {
    volume.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// Aggregation
// ============================================================================

proptest! {
    /// One row per period present, holding the exact sum of its volumes.
    #[test]
    fn aggregate_sums_exactly_per_period((day, tz, trades, _) in trades_and_shuffled()) {
        let rows = aggregate(&trades, day, tz);
        let expected = plain_sums(&trades);

        prop_assert_eq!(rows.len(), expected.len());
        for (row, (&period, &total)) in rows.iter().zip(&expected) {
            prop_assert_eq!(row.period, period);
            prop_assert_eq!(row.total_volume, total);
            prop_assert_eq!(row.timestamp_utc, period_start_utc(day, period, tz));
        }
        prop_assert!(rows.windows(2).all(|w| w[0].period < w[1].period));
    }

    /// Trade order and trade boundaries do not affect the result.
    #[test]
    fn aggregate_is_order_independent((day, tz, trades, shuffled) in trades_and_shuffled()) {
        let baseline = aggregate(&trades, day, tz);
        prop_assert_eq!(&aggregate(&shuffled, day, tz), &baseline);

        // Same records, one period per trade, in reverse
        let split: Vec<PowerTrade> = trades
            .iter()
            .flat_map(|t| t.periods.iter().map(|&p| PowerTrade::new(day, vec![p])))
            .rev()
            .collect();
        prop_assert_eq!(&aggregate(&split, day, tz), &baseline);
    }
}

// ============================================================================
// Rendering
// ============================================================================

proptest! {
    /// Header line plus exactly one line per row.
    #[test]
    fn render_has_header_and_one_line_per_row(rows in hourly_rows()) {
        let content = render_content(&rows);
        let lines: Vec<&str> = content.split('\n').collect();

        prop_assert_eq!(lines.len(), rows.len() + 1);
        prop_assert_eq!(lines[0], "Datetime;Volume");
        prop_assert!(!content.ends_with('\n'));
    }

    /// Parsing a rendered report gives back every timestamp and the volume
    /// rounded to two decimals.
    #[test]
    fn render_then_parse_recovers_rows(rows in hourly_rows()) {
        let parsed = parse_content(&render_content(&rows));
        prop_assert!(parsed.is_ok(), "{:?}", parsed);
        let parsed = parsed.unwrap_or_default();

        prop_assert_eq!(parsed.len(), rows.len());
        for ((timestamp, volume), row) in parsed.iter().zip(&rows) {
            prop_assert_eq!(*timestamp, row.timestamp_utc);
            prop_assert_eq!(*volume, two_dp(row.total_volume));
        }
    }

    /// Rendered volumes always carry exactly two decimals.
    #[test]
    fn rendered_volumes_have_two_decimals(rows in hourly_rows()) {
        let content = render_content(&rows);
        for line in content.split('\n').skip(1) {
            let volume = line.rsplit(';').next().unwrap_or_default();
            let decimals = volume.split_once('.').map(|(_, frac)| frac.len());
            prop_assert_eq!(decimals, Some(2), "{}", line);
            prop_assert!(volume != "-0.00");
        }
    }
}
