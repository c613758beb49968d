//! Report Pipeline Module
//!
//! ```text
//! Scheduler ──▶ ReportPipeline::generate_report()
//!                 1. delivery day from clock + timezone
//!                 2. fetch trades (RetryPolicy around TradingSource)
//!                 3. aggregate per period
//!                 4. render CSV + file name
//!                 5. ReportWriter
//! ```
//!
//! A failed cycle writes nothing and does not stop the scheduler.

mod report_pipeline;
pub mod retry;
pub mod scheduler;

pub use report_pipeline::ReportPipeline;
pub use retry::{RetryError, RetryOutcome, RetryPolicy, Retryable};
pub use scheduler::{ScheduledJob, Scheduler, SchedulerState, SchedulerStats};
