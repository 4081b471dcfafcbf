//! Environment variable overrides
//!
//! Every setting can be overridden with an `EVALRIG_` variable. Overrides are
//! applied on top of whatever the file loader produced.

use std::env;
use std::str::FromStr;

use super::model::EvalConfig;
use crate::error::{EvalError, EvalResult};

pub const ENV_METRICS: &str = "EVALRIG_METRICS";
pub const ENV_DELAY_TEARDOWN: &str = "EVALRIG_DELAY_TEARDOWN";
pub const ENV_QUEUE_CAPACITY: &str = "EVALRIG_QUEUE_CAPACITY";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "EVALRIG_SWEEP_INTERVAL_SECS";
pub const ENV_MAX_PROBE_FAILURES: &str = "EVALRIG_MAX_PROBE_FAILURES";
pub const ENV_LOG_LEVEL: &str = "EVALRIG_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "EVALRIG_LOG_FORMAT";

/// Apply overrides from the process environment
pub fn apply_env_overrides(config: &mut EvalConfig) -> EvalResult<()> {
    apply_overrides_from(config, |key| env::var(key).ok())
}

/// Apply overrides from an arbitrary variable source
pub fn apply_overrides_from<F>(config: &mut EvalConfig, lookup: F) -> EvalResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(metrics) = lookup(ENV_METRICS) {
        config.metrics = metrics
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(value) = lookup(ENV_DELAY_TEARDOWN) {
        config.delay_teardown = parse_bool(ENV_DELAY_TEARDOWN, &value)?;
    }
    if let Some(value) = lookup(ENV_QUEUE_CAPACITY) {
        config.events.queue_capacity = parse_number(ENV_QUEUE_CAPACITY, &value)?;
    }
    if let Some(value) = lookup(ENV_SWEEP_INTERVAL_SECS) {
        config.events.sweep_interval_secs = parse_number(ENV_SWEEP_INTERVAL_SECS, &value)?;
    }
    if let Some(value) = lookup(ENV_MAX_PROBE_FAILURES) {
        config.events.max_probe_failures = parse_number(ENV_MAX_PROBE_FAILURES, &value)?;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.logging.format = format;
    }

    Ok(())
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> EvalResult<T> {
    value.trim().parse().map_err(|_| {
        EvalError::config_with_context(
            format!("Invalid {} value", key),
            format!("Parsing '{}' as a number", value),
        )
    })
}

fn parse_bool(key: &str, value: &str) -> EvalResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EvalError::config_with_context(
            format!("Invalid {} value", key),
            format!("Parsing '{}' as a boolean", value),
        )),
    }
}
