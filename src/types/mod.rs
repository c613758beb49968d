//! Shared data structures for the power position report pipeline
//!
//! - `PowerTrade` / `PowerPeriod`: trade records from the trading service
//! - `HourlyVolume`: per-hour aggregate for one delivery day
//! - `ReportFile`: rendered CSV content plus its destination
//! - `CycleReport`: what a successful cycle produced

mod report;
mod trade;

pub use report::*;
pub use trade::*;
