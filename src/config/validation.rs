//! Config validation: unknown-key detection with Levenshtein suggestions
//! and operational range checks.
//!
//! Two-pass parse approach: first parse raw TOML into `toml::Value`, walk the
//! key tree, compare against known field names, and emit warnings with
//! "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::defaults;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `ReporterConfig`.
///
/// Maintained by hand to match the struct hierarchy in reporter_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [report]
        "report",
        "report.output_dir",
        "report.timezone",
        // [schedule]
        "schedule",
        "schedule.interval_minutes",
        "schedule.jitter_secs",
        // [retry]
        "retry",
        "retry.max_attempts",
        "retry.delay_ms",
        // [simulation]
        "simulation",
        "simulation.trades_per_day",
        "simulation.mean_volume",
        "simulation.volume_std_dev",
        "simulation.failure_rate",
        "simulation.fatal_failure_rate",
        "simulation.seed",
        // [logging]
        "logging",
        "logging.level",
        "logging.json",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        // Tie-break on the key itself so the suggestion does not depend on hash order
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Operational Range Validation
// ============================================================================

/// Validate value ranges on a parsed `ReporterConfig`.
///
/// Returns (errors, warnings). Errors are impossible values that must prevent
/// startup; warnings are legal but probably not what the operator meant.
pub fn validate_operational_ranges(
    config: &super::ReporterConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let sim = &config.simulation;
    for (name, rate) in [
        ("simulation.failure_rate", sim.failure_rate),
        ("simulation.fatal_failure_rate", sim.fatal_failure_rate),
    ] {
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            errors.push(format!("{name} = {rate} must be within 0.0-1.0"));
        }
    }
    if sim.failure_rate + sim.fatal_failure_rate > 1.0 {
        errors.push(format!(
            "simulation.failure_rate + fatal_failure_rate = {:.2} must not exceed 1.0",
            sim.failure_rate + sim.fatal_failure_rate
        ));
    }
    if !sim.mean_volume.is_finite() {
        errors.push("simulation.mean_volume must be a finite number".to_string());
    }
    if !sim.volume_std_dev.is_finite() || sim.volume_std_dev < 0.0 {
        errors.push(format!(
            "simulation.volume_std_dev = {} must be a finite number >= 0",
            sim.volume_std_dev
        ));
    }

    if config.schedule.interval_minutes > defaults::MAX_SENSIBLE_INTERVAL_MINUTES {
        warnings.push(ValidationWarning {
            field: "schedule.interval_minutes".to_string(),
            message: format!(
                "schedule.interval_minutes = {} is longer than a day; delivery days may be skipped",
                config.schedule.interval_minutes
            ),
            suggestion: None,
        });
    }

    if config.retry.max_attempts > defaults::MAX_SENSIBLE_ATTEMPTS {
        warnings.push(ValidationWarning {
            field: "retry.max_attempts".to_string(),
            message: format!(
                "retry.max_attempts = {} is unusually high for a rate-limited service",
                config.retry.max_attempts
            ),
            suggestion: None,
        });
    }

    // Worst-case retry time for one cycle vs the wait between cycles
    let worst_case_retry_ms = u64::from(config.retry.max_attempts.saturating_sub(1))
        .saturating_mul(config.retry.delay_ms);
    let interval_ms = config.schedule.interval_minutes.saturating_mul(60_000);
    if interval_ms > 0 && worst_case_retry_ms > interval_ms {
        warnings.push(ValidationWarning {
            field: "retry.delay_ms".to_string(),
            message: format!(
                "retry budget can take {worst_case_retry_ms} ms, longer than the {interval_ms} ms schedule interval"
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}
