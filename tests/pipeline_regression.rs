//! Pipeline Regression Tests
//!
//! Drives `ReportPipeline` end to end with scripted trading sources, a fixed
//! clock and both writer backends. Asserts on call counts, written files and
//! the exact CSV content, including DST transition days.

use async_trait::async_trait;
use chrono::NaiveDate;
use power_position::clock::FixedClock;
use power_position::pipeline::{ReportPipeline, RetryPolicy};
use power_position::report::parse_content;
use power_position::storage::{FileReportWriter, InMemoryReportWriter, ReportWriter, WriteError};
use power_position::trading::{TradingError, TradingSource};
use power_position::types::{PowerPeriod, PowerTrade};
use power_position::ReportError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fixtures
// ============================================================================

/// Fails with the scripted errors first, then serves `trades`.
struct ScriptedSource {
    errors: Vec<TradingError>,
    trades: Vec<PowerTrade>,
    calls: AtomicU32,
    requested: std::sync::Mutex<Vec<NaiveDate>>,
}

impl ScriptedSource {
    fn new(errors: Vec<TradingError>, trades: Vec<PowerTrade>) -> Arc<Self> {
        Arc::new(Self {
            errors,
            trades,
            calls: AtomicU32::new(0),
            requested: std::sync::Mutex::new(Vec::new()),
        })
    }

    fn always_transient() -> Arc<Self> {
        Self::new(vec![TradingError::Transient("down".into()); 100], Vec::new())
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradingSource for ScriptedSource {
    async fn fetch_trades(&self, date: NaiveDate) -> Result<Vec<PowerTrade>, TradingError> {
        self.requested.lock().unwrap().push(date);
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        match self.errors.get(n) {
            Some(err) => Err(err.clone()),
            None => Ok(self.trades.clone()),
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

struct BrokenDisk;

#[async_trait]
impl ReportWriter for BrokenDisk {
    async fn write_text(&self, _path: &Path, _content: &str) -> Result<(), WriteError> {
        Err(WriteError::Storage("disk full".into()))
    }

    fn backend_name(&self) -> &'static str {
        "broken"
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn full_day(day: NaiveDate, volume: Decimal) -> PowerTrade {
    PowerTrade::new(day, (1..=24).map(|p| PowerPeriod::new(p, volume)).collect())
}

fn pipeline_at(
    now: &str,
    source: Arc<ScriptedSource>,
    writer: Arc<dyn ReportWriter>,
    max_attempts: u32,
) -> ReportPipeline {
    ReportPipeline::new(
        source,
        writer,
        PathBuf::from("reports"),
        "Europe/Berlin",
        RetryPolicy::new(max_attempts, Duration::from_secs(1)).unwrap(),
    )
    .with_clock(Arc::new(FixedClock(now.parse().unwrap())))
}

// ============================================================================
// Retry behaviour
// ============================================================================

#[tokio::test(start_paused = true)]
async fn transient_failures_then_success_writes_one_file() {
    let day = date(2024, 6, 2);
    let source = ScriptedSource::new(
        vec![
            TradingError::Transient("busy".into()),
            TradingError::Transient("busy".into()),
        ],
        vec![full_day(day, dec!(1))],
    );
    let writer = Arc::new(InMemoryReportWriter::new());

    let report = assert_ok!(
        pipeline_at("2024-06-01T08:00:00Z", Arc::clone(&source), writer.clone(), 3)
            .try_generate_report()
            .await
    );

    assert_eq!(source.calls(), 3);
    assert_eq!(report.fetch_attempts, 3);
    assert_eq!(report.delivery_date, day);
    assert_eq!(writer.write_count(), 1);
    // Every attempt asked for the same delivery day
    assert!(source.requested.lock().unwrap().iter().all(|d| *d == day));
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_write_nothing_and_name_the_day() {
    let source = ScriptedSource::always_transient();
    let writer = Arc::new(InMemoryReportWriter::new());

    let err = assert_err!(
        pipeline_at("2024-06-01T08:00:00Z", Arc::clone(&source), writer.clone(), 3)
            .try_generate_report()
            .await
    );

    assert_eq!(source.calls(), 3);
    assert_eq!(writer.write_count(), 0);
    assert!(matches!(err, ReportError::RetryExhausted { attempts: 3, .. }));
    assert!(err.to_string().contains("2024-06-02"), "{err}");
}

#[tokio::test(start_paused = true)]
async fn single_attempt_budget_means_no_retry() {
    let source = ScriptedSource::always_transient();
    let writer = Arc::new(InMemoryReportWriter::new());
    let outcome = pipeline_at("2024-06-01T08:00:00Z", Arc::clone(&source), writer, 1)
        .generate_report()
        .await;
    assert!(outcome.is_none());
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn fatal_upstream_error_is_not_retried() {
    let source = ScriptedSource::new(vec![TradingError::Fatal("bad date".into())], Vec::new());
    let writer = Arc::new(InMemoryReportWriter::new());

    let err = pipeline_at("2024-06-01T08:00:00Z", Arc::clone(&source), writer.clone(), 5)
        .try_generate_report()
        .await
        .unwrap_err();

    assert_eq!(source.calls(), 1);
    assert_eq!(writer.write_count(), 0);
    assert!(matches!(err, ReportError::Upstream { .. }));
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_retry_delay_abandons_cycle() {
    let source = ScriptedSource::always_transient();
    let writer = Arc::new(InMemoryReportWriter::new());
    let cancel = CancellationToken::new();

    let pipeline = ReportPipeline::new(
        Arc::clone(&source) as Arc<dyn TradingSource>,
        writer.clone(),
        "reports",
        "Europe/Berlin",
        RetryPolicy::new(10, Duration::from_secs(30)).unwrap(),
    )
    .with_cancel_token(cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(45)).await;
        trigger.cancel();
    });

    let err = pipeline.try_generate_report().await.unwrap_err();
    assert!(matches!(err, ReportError::Cancelled { attempts: 2, .. }));
    assert_eq!(source.calls(), 2);
    assert_eq!(writer.write_count(), 0);
}

#[tokio::test]
async fn write_failure_is_reported_with_path_and_day() {
    let source = ScriptedSource::new(Vec::new(), vec![full_day(date(2024, 6, 2), dec!(1))]);
    let err = pipeline_at("2024-06-01T08:00:00Z", source, Arc::new(BrokenDisk), 3)
        .try_generate_report()
        .await
        .unwrap_err();
    match err {
        ReportError::Write {
            delivery_date,
            path,
            ..
        } => {
            assert_eq!(delivery_date, date(2024, 6, 2));
            assert_eq!(path, Path::new("reports/PowerPosition_20240602_202406010800.csv"));
        }
        other => panic!("expected write error, got {other:?}"),
    }
}

// ============================================================================
// Report content
// ============================================================================

#[tokio::test]
async fn two_trades_sum_into_one_row() {
    let day = date(2024, 6, 2);
    let source = ScriptedSource::new(
        Vec::new(),
        vec![
            PowerTrade::new(day, vec![PowerPeriod::new(1, dec!(10.0))]),
            PowerTrade::new(day, vec![PowerPeriod::new(1, dec!(5.5))]),
        ],
    );
    let writer = Arc::new(InMemoryReportWriter::new());

    let report = pipeline_at("2024-06-01T08:00:00Z", source, writer.clone(), 3)
        .try_generate_report()
        .await
        .unwrap();

    let content = writer.get(&report.destination).unwrap();
    assert_eq!(content, "Datetime;Volume\n2024-06-01T22:00:00Z;15.50");
    assert_eq!(report.trade_count, 2);
    assert_eq!(report.row_count, 1);
}

#[tokio::test]
async fn empty_trade_list_writes_header_only() {
    let source = ScriptedSource::new(Vec::new(), Vec::new());
    let writer = Arc::new(InMemoryReportWriter::new());
    let report = pipeline_at("2024-06-01T08:00:00Z", source, writer.clone(), 3)
        .try_generate_report()
        .await
        .unwrap();
    assert_eq!(writer.get(&report.destination).unwrap(), "Datetime;Volume");
    assert_eq!(report.row_count, 0);
}

#[tokio::test]
async fn spring_forward_day_has_contiguous_utc_hours() {
    // Generated on 2024-03-30 local, so the delivery day is the 23-hour 2024-03-31
    let day = date(2024, 3, 31);
    let source = ScriptedSource::new(Vec::new(), vec![full_day(day, dec!(2.5))]);
    let writer = Arc::new(InMemoryReportWriter::new());

    let report = pipeline_at("2024-03-30T12:00:00Z", source, writer.clone(), 3)
        .try_generate_report()
        .await
        .unwrap();
    assert_eq!(report.delivery_date, day);

    let rows = parse_content(&writer.get(&report.destination).unwrap()).unwrap();
    assert_eq!(rows.len(), 24);
    assert_eq!(rows[0].0.to_rfc3339(), "2024-03-30T23:00:00+00:00");
    assert_eq!(rows[2].0.to_rfc3339(), "2024-03-31T01:00:00+00:00");
    assert_eq!(rows[23].0.to_rfc3339(), "2024-03-31T22:00:00+00:00");
    for pair in rows.windows(2) {
        assert_eq!((pair[1].0 - pair[0].0).num_hours(), 1);
    }
    assert!(rows.iter().all(|(_, v)| *v == dec!(2.50)));
}

#[tokio::test]
async fn fall_back_day_starts_at_cest_midnight() {
    let day = date(2024, 10, 27);
    let source = ScriptedSource::new(Vec::new(), vec![full_day(day, dec!(1))]);
    let writer = Arc::new(InMemoryReportWriter::new());

    let report = pipeline_at("2024-10-26T09:00:00Z", source, writer.clone(), 3)
        .try_generate_report()
        .await
        .unwrap();

    let rows = parse_content(&writer.get(&report.destination).unwrap()).unwrap();
    assert_eq!(rows[0].0.to_rfc3339(), "2024-10-26T22:00:00+00:00");
    assert_eq!(rows[23].0.to_rfc3339(), "2024-10-27T21:00:00+00:00");
}

#[tokio::test]
async fn file_writer_lands_report_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let day = date(2024, 6, 2);
    let source = ScriptedSource::new(Vec::new(), vec![full_day(day, dec!(-1.005))]);

    let pipeline = ReportPipeline::new(
        source,
        Arc::new(FileReportWriter::new()),
        dir.path().join("out"),
        "Europe/Berlin",
        RetryPolicy::new(3, Duration::from_millis(10)).unwrap(),
    )
    .with_clock(Arc::new(FixedClock("2024-06-01T08:00:00Z".parse().unwrap())));

    let report = pipeline.try_generate_report().await.unwrap();
    assert_eq!(
        report.destination,
        dir.path().join("out").join("PowerPosition_20240602_202406010800.csv")
    );

    let content = std::fs::read_to_string(&report.destination).unwrap();
    let lines: Vec<&str> = content.split('\n').collect();
    assert_eq!(lines.len(), 25);
    assert_eq!(lines[1], "2024-06-01T22:00:00Z;-1.01");
    assert!(!content.ends_with('\n'));
}
