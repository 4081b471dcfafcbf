//! Configuration model

use serde::{Deserialize, Serialize};

use super::logging_config::LoggingConfig;
use crate::error::{EvalError, EvalResult};
use crate::metrics::{builtin_metric_names, metric_by_name, Metric};

/// Event hub settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Pending events kept per remote listener; the oldest are dropped past it
    pub queue_capacity: usize,
    /// Period of the background liveness sweep
    pub sweep_interval_secs: u64,
    /// Consecutive failed sweeps before a remote listener is dropped
    pub max_probe_failures: u32,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            sweep_interval_secs: 30,
            max_probe_failures: 3,
        }
    }
}

/// Evaluator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Metric names instantiated per (algorithm, dataset)
    pub metrics: Vec<String>,
    /// Defer teardown of every algorithm instance
    pub delay_teardown: bool,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            metrics: builtin_metric_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            delay_teardown: false,
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EvalConfig {
    pub fn with_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delay_teardown(mut self, delay: bool) -> Self {
        self.delay_teardown = delay;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.events.queue_capacity = capacity;
        self
    }

    pub fn with_max_probe_failures(mut self, failures: u32) -> Self {
        self.events.max_probe_failures = failures;
        self
    }

    /// Check the configuration for values the evaluator cannot run with
    pub fn validate(&self) -> EvalResult<()> {
        if self.metrics.is_empty() {
            return Err(EvalError::config("At least one metric must be configured"));
        }
        if let Some(unknown) = self.metrics.iter().find(|m| metric_by_name(m).is_none()) {
            return Err(EvalError::config_with_context(
                format!("Unknown metric: {}", unknown),
                format!("Known metrics: {}", builtin_metric_names().join(", ")),
            ));
        }
        for name in &self.metrics {
            let Some(metric) = metric_by_name(name) else {
                continue;
            };
            let missing: Vec<&str> = metric
                .constituents()
                .iter()
                .filter(|c| !self.metrics.contains(c))
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                return Err(EvalError::config(format!(
                    "Metric {} is derived from {}, which must be configured too",
                    name,
                    missing.join(", ")
                )));
            }
        }
        if self.events.queue_capacity == 0 {
            return Err(EvalError::config("events.queue_capacity must be positive"));
        }
        if self.events.sweep_interval_secs == 0 {
            return Err(EvalError::config(
                "events.sweep_interval_secs must be positive",
            ));
        }
        if self.events.max_probe_failures == 0 {
            return Err(EvalError::config(
                "events.max_probe_failures must be positive",
            ));
        }
        if !self.logging.is_valid_level() {
            return Err(EvalError::config(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }
        if !self.logging.is_valid_format() {
            return Err(EvalError::config(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
