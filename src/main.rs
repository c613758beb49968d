//! power-position - intraday power position reporter
//!
//! Every interval, fetches the next delivery day's trades, aggregates them per
//! hour and writes `PowerPosition_<yyyyMMdd>_<yyyyMMddHHmm>.csv` into the
//! output directory.
//!
//! # Usage
//!
//! ```bash
//! # Run on the configured schedule until Ctrl+C
//! cargo run --release
//!
//! # One report, then exit (non-zero status on failure)
//! ./power-position --once --output-dir /var/reports
//!
//! # Show the effective configuration
//! ./power-position --config power_position.toml --print-config
//! ```
//!
//! # Environment Variables
//!
//! - `POWER_POSITION_CONFIG`: Path to the TOML config file
//! - `RUST_LOG`: Log filter (default: `logging.level` from config, else info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use power_position::config::{self, ReporterConfig};
use power_position::pipeline::{ReportPipeline, RetryPolicy, Scheduler};
use power_position::storage::{FileReportWriter, ReporterLock};
use power_position::trading::{SimulatedPowerService, TradingSource};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "power-position")]
#[command(about = "Scheduled intraday power position reporter")]
#[command(version)]
struct CliArgs {
    /// TOML config file (otherwise ./power_position.toml or built-in defaults)
    #[arg(long, value_name = "PATH", env = config::defaults::CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Directory reports are written to
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Minutes between report cycles
    #[arg(long, value_name = "N")]
    interval_minutes: Option<u64>,

    /// Calls to the trading service per cycle before giving up
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// IANA timezone the delivery day is defined in (e.g. Europe/Berlin)
    #[arg(long, value_name = "IANA")]
    timezone: Option<String>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl CliArgs {
    /// Command-line values win over the config file.
    fn apply_overrides(&self, config: &mut ReporterConfig) {
        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }
        if let Some(minutes) = self.interval_minutes {
            config.schedule.interval_minutes = minutes;
        }
        if let Some(attempts) = self.max_attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(tz) = &self.timezone {
            config.report.timezone = tz.clone();
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

// ============================================================================
// Startup
// ============================================================================

fn load_config(args: &CliArgs) -> Result<ReporterConfig> {
    let mut config = match &args.config {
        Some(path) => ReporterConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ReporterConfig::load().context("Failed to load reporter config")?,
    };
    args.apply_overrides(&mut config);
    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;
    Ok(config)
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn init_logging(logging: &config::LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&logging.level))
        .with_target(false);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();

    // Config loading logs through a temporary subscriber; the real one depends
    // on the loaded logging section.
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config::defaults::LOG_LEVEL))
        .with_target(false)
        .finish();
    let config = tracing::subscriber::with_default(bootstrap, || load_config(&args))?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(&config.logging);

    info!(
        output_dir = %config.report.output_dir.display(),
        timezone = %config.report.timezone,
        interval_minutes = config.schedule.interval_minutes,
        max_attempts = config.retry.max_attempts,
        "Power position reporter starting"
    );

    let _lock = ReporterLock::acquire(&config.report.output_dir)?;

    let source: Arc<dyn TradingSource> = Arc::new(
        SimulatedPowerService::new(&config.simulation)
            .context("Invalid simulated volume distribution")?,
    );
    let retry = RetryPolicy::new(config.retry.max_attempts, config.retry_delay())?;

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut pipeline = ReportPipeline::new(
        source,
        Arc::new(FileReportWriter::new()),
        config.report.output_dir.clone(),
        config.report.timezone.clone(),
        retry,
    )
    .with_cancel_token(cancel_token.clone());

    if args.once {
        return match pipeline.try_generate_report().await {
            Ok(report) => {
                info!(path = %report.destination.display(), "Report written");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Report cycle failed");
                Err(e.into())
            }
        };
    }

    let stats = Scheduler::new(config.interval())
        .with_jitter(config.jitter())
        .run(&mut pipeline, cancel_token)
        .await;

    info!(cycles = stats.cycles, "Shutdown complete");
    Ok(())
}
