//! Logging configuration

use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub const LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    pub const FORMATS: &'static [&'static str] = &["pretty", "compact", "json"];

    /// Merge with another logging config
    pub fn merge(&mut self, other: LoggingConfig) {
        if !other.level.is_empty() {
            self.level = other.level;
        }
        if !other.format.is_empty() {
            self.format = other.format;
        }
    }

    pub fn is_valid_level(&self) -> bool {
        Self::LEVELS.contains(&self.level.to_lowercase().as_str())
    }

    pub fn is_valid_format(&self) -> bool {
        Self::FORMATS.contains(&self.format.to_lowercase().as_str())
    }
}
