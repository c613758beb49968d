//! Report cycle error taxonomy.
//!
//! Every variant is terminal for the cycle that produced it. None of them
//! reach the scheduler: the pipeline logs them and the next trigger runs as
//! usual.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::storage::WriteError;
use crate::trading::TradingError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Bad settings discovered at cycle time (e.g. unknown timezone identifier).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every attempt against the trading service failed transiently.
    #[error("no trades for delivery day {delivery_date} after {attempts} attempt(s): {last_error}")]
    RetryExhausted {
        delivery_date: NaiveDate,
        attempts: u32,
        last_error: TradingError,
    },

    /// The trading service failed in a way retrying cannot fix.
    #[error("trades for delivery day {delivery_date} could not be fetched (attempt {attempts}): {source}")]
    Upstream {
        delivery_date: NaiveDate,
        attempts: u32,
        #[source]
        source: TradingError,
    },

    /// Shutdown was requested while waiting to retry.
    #[error("report for delivery day {delivery_date} cancelled after {attempts} attempt(s)")]
    Cancelled {
        delivery_date: NaiveDate,
        attempts: u32,
    },

    /// The rendered report could not be persisted.
    #[error("failed to write report {} for delivery day {delivery_date}: {source}", .path.display())]
    Write {
        delivery_date: NaiveDate,
        path: PathBuf,
        #[source]
        source: WriteError,
    },
}

impl ReportError {
    /// Delivery day the failed cycle was producing, when it got that far.
    pub fn delivery_date(&self) -> Option<NaiveDate> {
        match self {
            ReportError::RetryExhausted { delivery_date, .. }
            | ReportError::Upstream { delivery_date, .. }
            | ReportError::Cancelled { delivery_date, .. }
            | ReportError::Write { delivery_date, .. } => Some(*delivery_date),
            ReportError::Configuration(_) => None,
        }
    }
}
