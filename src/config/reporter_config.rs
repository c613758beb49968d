//! Reporter Configuration - schedule, retry and output settings as TOML values
//!
//! Every field has a built-in default, so an empty or missing file yields a
//! runnable configuration.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a reporter deployment.
///
/// Load with `ReporterConfig::load()` which searches:
/// 1. `$POWER_POSITION_CONFIG` env var
/// 2. `./power_position.toml`
/// 3. Built-in defaults when neither file exists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Output location and delivery-day timezone
    #[serde(default)]
    pub report: ReportConfig,

    /// Scheduler cadence
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Trading service retry budget
    #[serde(default)]
    pub retry: RetryConfig,

    /// Simulated trading service parameters
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReporterConfig {
    /// Load configuration using the standard search order:
    /// 1. `$POWER_POSITION_CONFIG` environment variable
    /// 2. `./power_position.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// Defaults are used only when no file is found. A file that exists but
    /// fails to parse or validate is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(defaults::CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_from_candidates(env_path.as_deref(), Path::new(defaults::CONFIG_FILE_NAME))
    }

    /// Search order behind [`ReporterConfig::load`] with explicit paths.
    ///
    /// An `env_path` that does not exist is an `Io` error rather than a
    /// silent fallback.
    pub fn load_from_candidates(env_path: Option<&Path>, local: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = env_path {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded reporter config from {}", defaults::CONFIG_ENV_VAR);
            return Ok(config);
        }

        if local.exists() {
            let config = Self::load_from_file(local)?;
            info!(path = %local.display(), "Loaded reporter config");
            return Ok(config);
        }

        info!("No {} found, using built-in defaults", defaults::CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings, never rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all settings for internal consistency.
    ///
    /// Collects every problem instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.report.output_dir.as_os_str().is_empty() {
            errors.push("report.output_dir must not be empty".to_string());
        }
        if self.report.timezone.parse::<Tz>().is_err() {
            errors.push(format!(
                "report.timezone '{}' is not a known IANA time zone",
                self.report.timezone
            ));
        }

        if self.schedule.interval_minutes == 0 {
            errors.push("schedule.interval_minutes must be > 0".to_string());
        }
        if self.schedule.jitter_secs >= self.schedule.interval_minutes.saturating_mul(60)
            && self.schedule.jitter_secs > 0
        {
            errors.push(format!(
                "schedule.jitter_secs ({}) must be shorter than the interval ({} min)",
                self.schedule.jitter_secs, self.schedule.interval_minutes
            ));
        }

        if self.retry.max_attempts == 0 {
            errors.push("retry.max_attempts must be >= 1".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_operational_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Wait between the end of one cycle and the start of the next.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_minutes.saturating_mul(60))
    }

    /// Maximum random offset applied to each wait.
    pub fn jitter(&self) -> Duration {
        Duration::from_secs(self.schedule.jitter_secs)
    }

    /// Delay between two attempts against the trading service.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry.delay_ms)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory the CSV files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// IANA zone used to resolve the delivery day (e.g. "Europe/Berlin")
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(defaults::OUTPUT_DIR)
}
fn default_timezone() -> String {
    defaults::TIMEZONE.to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            timezone: default_timezone(),
        }
    }
}

// ============================================================================
// Schedule
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minutes to wait after a cycle completes
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Random +/- offset applied to each wait (seconds, 0 = deterministic)
    #[serde(default)]
    pub jitter_secs: u64,
}

fn default_interval_minutes() -> u64 { defaults::INTERVAL_MINUTES }

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            jitter_secs: 0,
        }
    }
}

// ============================================================================
// Retry
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total calls per cycle, including the first (>= 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 { defaults::MAX_ATTEMPTS }
fn default_retry_delay_ms() -> u64 { defaults::RETRY_DELAY_MS }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Parameters of the built-in simulated trading service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Trades returned per delivery day
    #[serde(default = "default_trades_per_day")]
    pub trades_per_day: u32,

    /// Mean per-period volume (MW)
    #[serde(default = "default_mean_volume")]
    pub mean_volume: f64,

    /// Standard deviation of per-period volume (MW)
    #[serde(default = "default_volume_std_dev")]
    pub volume_std_dev: f64,

    /// Probability of a transient failure per call (0.0-1.0)
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Probability of a non-retryable failure per call (0.0-1.0)
    #[serde(default)]
    pub fatal_failure_rate: f64,

    /// Fixed RNG seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_trades_per_day() -> u32 { defaults::SIMULATED_TRADES_PER_DAY }
fn default_mean_volume() -> f64 { defaults::SIMULATED_MEAN_VOLUME }
fn default_volume_std_dev() -> f64 { defaults::SIMULATED_VOLUME_STD_DEV }
fn default_failure_rate() -> f64 { defaults::SIMULATED_FAILURE_RATE }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trades_per_day: default_trades_per_day(),
            mean_volume: default_mean_volume(),
            volume_std_dev: default_volume_std_dev(),
            failure_rate: default_failure_rate(),
            fatal_failure_rate: 0.0,
            seed: None,
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    defaults::LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
