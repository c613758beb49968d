//! System-wide default constants.
//!
//! Centralises the values used when no config file is present.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV_VAR: &str = "POWER_POSITION_CONFIG";

/// Config file looked up in the current working directory.
pub const CONFIG_FILE_NAME: &str = "power_position.toml";

// ============================================================================
// Report
// ============================================================================

/// Directory reports are written to.
pub const OUTPUT_DIR: &str = "reports";

/// IANA zone the delivery day is resolved in.
pub const TIMEZONE: &str = "Europe/Berlin";

// ============================================================================
// Scheduler
// ============================================================================

/// Minutes between the end of one cycle and the start of the next.
pub const INTERVAL_MINUTES: u64 = 5;

/// Upper bound (minutes) before the interval is flagged as suspicious.
///
/// 1 440 = one report per day.
pub const MAX_SENSIBLE_INTERVAL_MINUTES: u64 = 1_440;

// ============================================================================
// Retry
// ============================================================================

/// Calls to the trading service per cycle, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between attempts (milliseconds).
pub const RETRY_DELAY_MS: u64 = 1_000;

/// Upper bound before the attempt budget is flagged as suspicious.
pub const MAX_SENSIBLE_ATTEMPTS: u32 = 20;

// ============================================================================
// Simulation
// ============================================================================

/// Trades generated per delivery day by the simulated service.
pub const SIMULATED_TRADES_PER_DAY: u32 = 2;

/// Mean period volume (MW) of simulated trades.
pub const SIMULATED_MEAN_VOLUME: f64 = 100.0;

/// Standard deviation of simulated period volumes (MW).
pub const SIMULATED_VOLUME_STD_DEV: f64 = 50.0;

/// Probability that a simulated call fails transiently.
pub const SIMULATED_FAILURE_RATE: f64 = 0.1;

// ============================================================================
// Logging
// ============================================================================

/// Log filter used when `RUST_LOG` is not set.
pub const LOG_LEVEL: &str = "info";
