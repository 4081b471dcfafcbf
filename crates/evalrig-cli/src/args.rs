//! CLI argument definitions using clap
//!
//! - evalrig run --pool pool.json        # Evaluate baselines over a pool
//! - evalrig metrics                     # List built-in metrics
//! - evalrig algorithms                  # List baseline algorithms
//! - evalrig config init|show|validate   # Manage configuration files
//! - evalrig ipc                         # JSON-Lines control over stdio

use clap::{Parser, Subcommand};
use evalrig_core::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "evalrig")]
#[command(about = "Evalrig - evaluation harness for prediction and recommendation algorithms")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (JSON, TOML or YAML)
    #[arg(long, global = true, env = "EVALRIG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate algorithms over a dataset pool file
    Run {
        /// Dataset pool file (JSON)
        #[arg(long)]
        pool: PathBuf,

        /// Comma-separated baseline algorithm names
        #[arg(long, value_delimiter = ',', default_value = "global_mean")]
        algorithms: Vec<String>,

        /// Report format: table, markdown or json
        #[arg(long, default_value = "table")]
        format: String,

        /// Extra parameter passed to every algorithm setup, as JSON
        #[arg(long)]
        extra: Option<String>,

        /// Write the report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// List built-in metrics
    Metrics,

    /// List baseline algorithms
    Algorithms,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Serve the JSON-Lines control protocol on stdin/stdout
    Ipc,
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        #[arg(long)]
        config_file: Option<PathBuf>,
    },

    /// Validate a configuration file
    Validate {
        #[arg(long)]
        config_file: Option<PathBuf>,
    },
}
