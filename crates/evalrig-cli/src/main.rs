//! Evalrig command-line interface
//!
//! ```bash
//! cargo install --path crates/evalrig-cli
//! ```
//!
//! ## Run mode
//! Evaluate baseline algorithms over a dataset pool file and print a report.
//!
//! - **Command:** `evalrig run --pool pool.json --algorithms global_mean,item_mean`
//!
//! ## IPC mode
//! Serve the JSON-Lines control protocol on stdin/stdout so another process
//! can start, pause, resume and stop runs and poll their events.
//!
//! - **Command:** `evalrig ipc`
//!
//! ## Utility commands
//! `evalrig metrics`, `evalrig algorithms`, `evalrig config init|show|validate`.

mod algorithms;
mod args;
mod commands;
mod console;
mod ipc;
mod logging;
mod pool;
mod router;

use clap::Parser;
use evalrig_core::config::{load_config, resolve_config_path};

pub use args::{Cli, Commands, ConfigAction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A broken config file is reported by the command itself; logging falls
    // back to defaults until then.
    let logging = load_config(resolve_config_path(cli.config.as_deref()).as_deref())
        .map(|config| config.logging)
        .unwrap_or_default();
    logging::init_tracing(&logging, cli.verbose);

    router::route(cli).await
}
