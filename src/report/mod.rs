//! Report construction: delivery-day arithmetic, hourly aggregation, CSV output.
//!
//! Everything here is pure. The pipeline feeds it trades and a clock reading;
//! I/O happens elsewhere.

pub mod aggregator;
pub mod delivery;
pub mod renderer;

pub use aggregator::aggregate;
pub use delivery::{delivery_date, hours_in_day, local_midnight_utc, period_start_utc, resolve_timezone};
pub use renderer::{parse_content, render, render_content, render_file_name, ParseError};
