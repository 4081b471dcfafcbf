//! Command routing logic for CLI

use anyhow::Result;
use evalrig_core::config::{load_config, resolve_config_path};
use evalrig_core::EvalConfig;

use crate::args::{Cli, Commands, ConfigAction};
use crate::commands;
use crate::commands::run::RunOptions;
use crate::ipc;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            pool,
            algorithms,
            format,
            extra,
            output,
            no_progress,
        } => {
            let config = effective_config(&cli.config)?;
            let options = RunOptions {
                pool,
                algorithms,
                format,
                extra,
                output,
                show_progress: !no_progress,
                verbose: cli.verbose,
            };
            commands::run::run(config, options).await
        }
        Commands::Metrics => commands::catalog::metrics(),
        Commands::Algorithms => commands::catalog::algorithms(),
        Commands::Config { action } => route_config(action, cli.config.as_deref()),
        Commands::Ipc => {
            let config = effective_config(&cli.config)?;
            ipc::run_ipc_server(config).await
        }
    }
}

fn route_config(action: ConfigAction, global: Option<&std::path::Path>) -> Result<()> {
    match action {
        ConfigAction::Init { config_file, force } => commands::config::init(&config_file, force),
        ConfigAction::Show { config_file } => {
            commands::config::show(config_file.as_deref().or(global))
        }
        ConfigAction::Validate { config_file } => {
            commands::config::validate(config_file.as_deref().or(global))
        }
    }
}

fn effective_config(explicit: &Option<std::path::PathBuf>) -> Result<EvalConfig> {
    let path = resolve_config_path(explicit.as_deref());
    Ok(load_config(path.as_deref())?)
}
