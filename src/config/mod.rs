//! Reporter Configuration Module
//!
//! Schedule, retry budget, output location and delivery-day timezone, loaded
//! from TOML with built-in defaults for every field.
//!
//! ## Loading Order
//!
//! 1. `--config <PATH>` on the command line
//! 2. `POWER_POSITION_CONFIG` environment variable (path to TOML file)
//! 3. `power_position.toml` in the current working directory
//! 4. Built-in defaults, only when no file is found
//!
//! A file that exists but does not parse or validate is an error.
//!
//! ```ignore
//! let config = ReporterConfig::load()?;
//! let interval = config.interval();
//! ```

mod reporter_config;
pub mod defaults;
pub mod validation;

pub use reporter_config::*;
