//! Configuration management commands

use std::path::Path;

use anyhow::{Result, bail};
use evalrig_core::EvalConfig;
use evalrig_core::config::{load_config, load_from_file, resolve_config_path, save_to_file};

use crate::console::CliConsole;

/// Show the effective configuration (file plus environment overrides)
pub fn show(config_file: Option<&Path>) -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration");

    let path = resolve_config_path(config_file);
    match &path {
        Some(path) if path.exists() => {
            console.success(&format!("Loaded configuration from: {}", path.display()))
        }
        Some(path) => {
            console.warn(&format!("Configuration file not found: {}", path.display()));
            console.info("Using default configuration");
        }
        None => console.info("No configuration file, using defaults"),
    }

    let config = load_config(path.as_deref())?;
    print_config(&config);
    Ok(())
}

/// Validate a configuration file
pub fn validate(config_file: Option<&Path>) -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Validation");

    let Some(path) = resolve_config_path(config_file) else {
        bail!("No configuration file found");
    };
    if !path.exists() {
        bail!("Configuration file not found: {}", path.display());
    }

    console.info(&format!("Validating configuration file: {}", path.display()));
    let config = match load_from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            console.error(&format!("Failed to load configuration: {e}"));
            return Err(e.into());
        }
    };
    if let Err(e) = config.validate() {
        console.error(&format!("Configuration validation failed: {e}"));
        return Err(e.into());
    }

    console.success("Configuration is valid");
    console.print_separator();
    console.info(&format!("Metrics: {}", config.metrics.join(", ")));
    console.info(&format!(
        "Remote queue capacity: {}",
        config.events.queue_capacity
    ));
    Ok(())
}

/// Write a configuration file with default values
pub fn init(config_file: &Path, force: bool) -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Initialization");

    if config_file.exists() && !force {
        console.error(&format!(
            "Configuration file already exists: {}",
            config_file.display()
        ));
        console.info("Use --force to overwrite");
        bail!("Configuration file already exists");
    }

    save_to_file(&EvalConfig::default(), config_file)?;
    console.success(&format!(
        "Created configuration file: {}",
        config_file.display()
    ));
    Ok(())
}

fn print_config(config: &EvalConfig) {
    println!("  metrics:              {}", config.metrics.join(", "));
    println!("  delay_teardown:       {}", config.delay_teardown);
    println!("  queue_capacity:       {}", config.events.queue_capacity);
    println!("  sweep_interval_secs:  {}", config.events.sweep_interval_secs);
    println!("  max_probe_failures:   {}", config.events.max_probe_failures);
    println!("  log level / format:   {} / {}", config.logging.level, config.logging.format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_validate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("evalrig.toml");

        init(&path, false).unwrap();
        assert!(path.exists());
        validate(Some(&path)).unwrap();

        assert!(init(&path, false).is_err());
        init(&path, true).unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("evalrig.json");
        std::fs::write(&path, r#"{ "metrics": ["nope"] }"#).unwrap();
        assert!(validate(Some(&path)).is_err());

        assert!(validate(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
