//! One report cycle: delivery day → trades → hourly totals → CSV → writer.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::retry::{RetryError, RetryPolicy};
use super::scheduler::ScheduledJob;
use crate::clock::{Clock, SystemClock};
use crate::error::ReportError;
use crate::report::{aggregator, delivery, renderer};
use crate::storage::ReportWriter;
use crate::trading::TradingSource;
use crate::types::{CycleReport, ReportFile};

/// Produces one power position report per call.
///
/// Built with [`new()`](ReportPipeline::new); tests swap the clock and the
/// cancellation token with the `with_*` builders.
pub struct ReportPipeline {
    source: Arc<dyn TradingSource>,
    writer: Arc<dyn ReportWriter>,
    clock: Arc<dyn Clock>,
    output_dir: PathBuf,
    timezone: String,
    retry: RetryPolicy,
    cancel_token: CancellationToken,
}

impl ReportPipeline {
    pub fn new(
        source: Arc<dyn TradingSource>,
        writer: Arc<dyn ReportWriter>,
        output_dir: impl Into<PathBuf>,
        timezone: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            writer,
            clock: Arc::new(SystemClock),
            output_dir: output_dir.into(),
            timezone: timezone.into(),
            retry,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Token raced against retry delays; cancel it to abandon a cycle that is
    /// waiting to retry.
    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Run a cycle, logging any failure. Never propagates an error.
    pub async fn generate_report(&self) -> Option<CycleReport> {
        match self.try_generate_report().await {
            Ok(report) => Some(report),
            Err(e @ ReportError::Cancelled { .. }) => {
                warn!(error = %e, "[ReportPipeline] Cycle abandoned on shutdown");
                None
            }
            Err(e) => {
                let delivery_date = e.delivery_date().map(|d| d.to_string());
                error!(
                    delivery_date = delivery_date.as_deref().unwrap_or("unknown"),
                    error = %e,
                    "[ReportPipeline] Report cycle failed, no file written"
                );
                None
            }
        }
    }

    /// Run a cycle and hand back the outcome.
    pub async fn try_generate_report(&self) -> Result<CycleReport, ReportError> {
        let tz = delivery::resolve_timezone(&self.timezone)?;
        let delivery_date = delivery::delivery_date(self.clock.now(), tz);

        info!(
            delivery_date = %delivery_date,
            source = self.source.source_name(),
            "[ReportPipeline] Generating power position report"
        );
        let hours = delivery::hours_in_day(delivery_date, tz);
        if hours != 24 {
            info!(delivery_date = %delivery_date, hours, "[ReportPipeline] DST transition day");
        }

        let fetched = self
            .retry
            .with_retry(&self.cancel_token, |attempt| {
                debug!(attempt, delivery_date = %delivery_date, "[ReportPipeline] Fetching trades");
                self.source.fetch_trades(delivery_date)
            })
            .await
            .map_err(|e| match e {
                RetryError::Exhausted {
                    attempts,
                    last_error,
                } => ReportError::RetryExhausted {
                    delivery_date,
                    attempts,
                    last_error,
                },
                RetryError::Fatal { attempt, error } => ReportError::Upstream {
                    delivery_date,
                    attempts: attempt,
                    source: error,
                },
                RetryError::Cancelled { attempts, .. } => ReportError::Cancelled {
                    delivery_date,
                    attempts,
                },
            })?;
        let trades = fetched.value;
        // File name carries the instant the report was produced, after any retries
        let generated_at = self.clock.now();

        let volumes = aggregator::aggregate(&trades, delivery_date, tz);
        let (file_name, content) = renderer::render(&volumes, delivery_date, generated_at);
        let report = ReportFile {
            destination: self.output_dir.join(&file_name),
            file_name,
            content,
        };

        self.writer
            .write_text(&report.destination, &report.content)
            .await
            .map_err(|source| ReportError::Write {
                delivery_date,
                path: report.destination.clone(),
                source,
            })?;

        info!(
            delivery_date = %delivery_date,
            path = %report.destination.display(),
            trades = trades.len(),
            rows = volumes.len(),
            attempts = fetched.attempts,
            "[ReportPipeline] Report written"
        );

        Ok(CycleReport {
            delivery_date,
            generated_at,
            destination: report.destination,
            trade_count: trades.len(),
            row_count: volumes.len(),
            fetch_attempts: fetched.attempts,
        })
    }
}

#[async_trait]
impl ScheduledJob for ReportPipeline {
    async fn run_cycle(&mut self) {
        self.generate_report().await;
    }

    fn job_name(&self) -> &str {
        "power-position-report"
    }
}
