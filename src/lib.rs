//! Power Position: scheduled intraday power position reports
//!
//! Every cycle the reporter asks the trading service for tomorrow's trades
//! (tomorrow in the market timezone), sums their volumes per hourly period and
//! writes the totals as a `;`-delimited CSV file.
//!
//! ## Architecture
//!
//! - **Scheduler**: periodic trigger, cancellable between cycles
//! - **Report Pipeline**: delivery day, fetch with retry, aggregate, render, write
//! - **Report**: pure delivery-day arithmetic, aggregation and CSV rendering
//! - **Trading**: source abstraction plus a simulated service
//! - **Storage**: report writers and the output directory lock

pub mod clock;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod trading;
pub mod types;

pub use config::ReporterConfig;
pub use error::ReportError;
pub use pipeline::{ReportPipeline, RetryPolicy, Scheduler};
pub use types::{CycleReport, HourlyVolume, PowerPeriod, PowerTrade, ReportFile};
