//! Configuration management
//!
//! Configuration is resolved in three layers: built-in defaults, an optional
//! JSON/TOML/YAML file, then `EVALRIG_` environment overrides.

pub mod env_loader;
pub mod file_loader;
pub mod logging_config;
pub mod model;

pub use env_loader::{apply_env_overrides, apply_overrides_from};
pub use file_loader::{load_from_file, save_to_file};
pub use logging_config::LoggingConfig;
pub use model::{EvalConfig, EventsConfig};

use std::path::{Path, PathBuf};

use crate::error::EvalResult;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "evalrig.toml";

/// Per-user configuration file, `<config dir>/evalrig/evalrig.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("evalrig").join(DEFAULT_CONFIG_FILE))
}

/// Configuration file to use when none is given: the working directory's
/// file if present, else the per-user file
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    user_config_path().filter(|path| path.exists())
}

/// Load and validate configuration from `path` (defaults when absent) with
/// environment overrides applied
pub fn load_config(path: Option<&Path>) -> EvalResult<EvalConfig> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => EvalConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}
