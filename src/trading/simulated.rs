//! Simulated trading service.
//!
//! Stands in for the real trading API: every call returns a fresh set of
//! trades with normally distributed period volumes, and a configurable share
//! of calls fail the way the real service does when it is briefly unavailable.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};
use rust_decimal::Decimal;
use tracing::debug;

use super::{TradingError, TradingSource};
use crate::config::SimulationConfig;
use crate::types::{PowerPeriod, PowerTrade, PERIODS_PER_DAY};

/// Random trade generator with injected failures.
pub struct SimulatedPowerService {
    rng: Mutex<StdRng>,
    volume: Normal<f64>,
    trades_per_day: u32,
    failure_rate: f64,
    fatal_failure_rate: f64,
}

impl SimulatedPowerService {
    /// Build a service from its config section.
    ///
    /// Fails only if the volume distribution parameters are not finite.
    pub fn new(config: &SimulationConfig) -> Result<Self, NormalError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng: Mutex::new(rng),
            volume: Normal::new(config.mean_volume, config.volume_std_dev)?,
            trades_per_day: config.trades_per_day,
            failure_rate: config.failure_rate,
            fatal_failure_rate: config.fatal_failure_rate,
        })
    }

    fn generate(&self, date: NaiveDate) -> Result<Vec<PowerTrade>, TradingError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| TradingError::Fatal(format!("simulator state poisoned: {e}")))?;

        let roll: f64 = rng.gen();
        if roll < self.fatal_failure_rate {
            return Err(TradingError::Fatal(format!("no trading calendar for {date}")));
        }
        if roll < self.fatal_failure_rate + self.failure_rate {
            return Err(TradingError::Transient(
                "error retrieving power volumes".to_string(),
            ));
        }

        let trades = (0..self.trades_per_day)
            .map(|_| {
                let periods = (1..=PERIODS_PER_DAY)
                    .map(|period| {
                        let raw = self.volume.sample(&mut *rng);
                        let volume = Decimal::from_f64_retain(raw)
                            .unwrap_or_default()
                            .round_dp(3);
                        PowerPeriod::new(period, volume)
                    })
                    .collect();
                PowerTrade::new(date, periods)
            })
            .collect();
        Ok(trades)
    }
}

#[async_trait]
impl TradingSource for SimulatedPowerService {
    async fn fetch_trades(&self, date: NaiveDate) -> Result<Vec<PowerTrade>, TradingError> {
        let trades = self.generate(date)?;
        debug!(delivery_date = %date, trades = trades.len(), "Simulated trades generated");
        Ok(trades)
    }

    fn source_name(&self) -> &str {
        "simulated"
    }
}
