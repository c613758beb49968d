//! Trade records as delivered by the trading service.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Number of hourly periods in a standard delivery day.
pub const PERIODS_PER_DAY: u8 = 24;

/// Volume traded for one hourly period of a delivery day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerPeriod {
    /// 1-based period index; 1 is the first hour after local midnight.
    pub period: u8,
    /// Signed traded volume (MW)
    pub volume: Decimal,
}

impl PowerPeriod {
    pub fn new(period: u8, volume: Decimal) -> Self {
        Self { period, volume }
    }

    /// Whether the index falls inside `1..=24`.
    pub fn is_valid(&self) -> bool {
        (1..=PERIODS_PER_DAY).contains(&self.period)
    }
}

/// One trade covering a single delivery day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerTrade {
    /// Delivery day this trade belongs to
    pub date: NaiveDate,
    /// Per-period volumes, ordered by period index
    pub periods: Vec<PowerPeriod>,
}

impl PowerTrade {
    pub fn new(date: NaiveDate, periods: Vec<PowerPeriod>) -> Self {
        Self { date, periods }
    }

    /// A trade with `period_count` periods, all carrying zero volume.
    pub fn empty(date: NaiveDate, period_count: u8) -> Self {
        let periods = (1..=period_count)
            .map(|period| PowerPeriod::new(period, Decimal::ZERO))
            .collect();
        Self { date, periods }
    }

    /// Sum of volumes across every period of this trade.
    pub fn total_volume(&self) -> Decimal {
        self.periods.iter().map(|p| p.volume).sum()
    }
}
