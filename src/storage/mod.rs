//! Report persistence and the single-instance lock.

pub mod lockfile;
pub mod writer;

pub use lockfile::ReporterLock;
pub use writer::{FileReportWriter, InMemoryReportWriter, ReportWriter, WriteError};
