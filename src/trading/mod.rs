//! Trading-data source abstraction.
//!
//! The report pipeline never talks to a concrete trading service. It asks a
//! [`TradingSource`] for the trades of one delivery day and relies on the
//! [`TradingError`] variant to decide whether a failed call is worth retrying.
//!
//! ```
//! use async_trait::async_trait;
//! use chrono::NaiveDate;
//! use power_position::trading::{TradingError, TradingSource};
//! use power_position::types::PowerTrade;
//!
//! struct NoTrades;
//!
//! #[async_trait]
//! impl TradingSource for NoTrades {
//!     async fn fetch_trades(&self, _date: NaiveDate) -> Result<Vec<PowerTrade>, TradingError> {
//!         Ok(Vec::new())
//!     }
//!
//!     fn source_name(&self) -> &str {
//!         "none"
//!     }
//! }
//! ```

pub mod simulated;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::pipeline::retry::Retryable;
use crate::types::PowerTrade;

pub use simulated::SimulatedPowerService;

/// Errors a trading source can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradingError {
    /// Momentary unavailability; the same call may succeed shortly.
    #[error("trading service temporarily unavailable: {0}")]
    Transient(String),
    /// Anything that will not go away by calling again.
    #[error("trading service failed: {0}")]
    Fatal(String),
}

impl Retryable for TradingError {
    fn is_transient(&self) -> bool {
        matches!(self, TradingError::Transient(_))
    }
}

/// Where trades come from.
///
/// Implementations must be safe to call again with the same date after a
/// failure; the retry policy relies on it.
#[async_trait]
pub trait TradingSource: Send + Sync {
    /// Fetch every trade for the given delivery day.
    async fn fetch_trades(&self, date: NaiveDate) -> Result<Vec<PowerTrade>, TradingError>;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}
