//! Evaluate baseline algorithms over a dataset pool file

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use colored::*;
use evalrig_core::{
    EvalConfig, EvaluationRunner, LifecycleEvent, LifecycleStatus, ProgressEvent, ReportFormat,
    SetupEvent, SetupStatus, generate_report,
};

use crate::algorithms::baselines_by_names;
use crate::console::CliConsole;
use crate::pool::load_pool;

/// Options of `evalrig run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pool: PathBuf,
    pub algorithms: Vec<String>,
    pub format: String,
    pub extra: Option<String>,
    pub output: Option<PathBuf>,
    pub show_progress: bool,
    pub verbose: bool,
}

pub async fn run(config: EvalConfig, options: RunOptions) -> Result<()> {
    let console = CliConsole::new(options.verbose);

    let format = ReportFormat::parse(&options.format)
        .ok_or_else(|| anyhow!("Unknown report format: {}", options.format))?;
    let extra = match &options.extra {
        Some(raw) => serde_json::from_str(raw).context("--extra is not valid JSON")?,
        None => serde_json::Value::Null,
    };
    let pool = load_pool(&options.pool)?;
    let algorithms = baselines_by_names(&options.algorithms)?;
    let pair_count = pool.len();
    let algorithm_count = algorithms.len();

    let runner = Arc::new(EvaluationRunner::new(config)?);
    let bar = options
        .show_progress
        .then(|| console.progress_bar(0));

    if let Some(bar) = &bar {
        let progress_bar = bar.clone();
        runner
            .hub()
            .add_progress_listener(Arc::new(move |event: &ProgressEvent| {
                if event.step == 1 {
                    progress_bar.set_length(event.total as u64);
                    progress_bar.set_message(format!(
                        "{} on dataset {} ({}/{})",
                        event.algorithm,
                        event.dataset_id,
                        event.algorithm_index * event.dataset_count + event.dataset_index + 1,
                        event.algorithm_count * event.dataset_count,
                    ));
                }
                progress_bar.set_position(event.step as u64);
            }));

        let setup_bar = bar.clone();
        runner
            .hub()
            .add_setup_listener(Arc::new(move |event: &SetupEvent| {
                if event.status == SetupStatus::Doing {
                    setup_bar.set_position(0);
                    setup_bar.set_message(format!(
                        "setting up {} on dataset {}",
                        event.algorithm, event.dataset_id
                    ));
                }
            }));
    }

    if options.verbose {
        let lifecycle_bar = bar.clone();
        runner
            .hub()
            .add_lifecycle_listener(Arc::new(move |event: &LifecycleEvent| {
                if event.status != LifecycleStatus::DoneOne {
                    return;
                }
                let line = format!(
                    "{} {} on dataset {}",
                    "✓".green(),
                    event.algorithm.as_deref().unwrap_or("?"),
                    event.dataset_id.unwrap_or_default()
                );
                match &lifecycle_bar {
                    Some(bar) => bar.println(line),
                    None => println!("{}", line),
                }
            }));
    }

    console.info(&format!(
        "Evaluating {} algorithm(s) over {} dataset pair(s)",
        algorithm_count, pair_count
    ));
    runner.evaluate(algorithms, pool, extra)?;

    let waiter = {
        let runner = Arc::clone(&runner);
        tokio::task::spawn_blocking(move || runner.wait())
    };
    tokio::select! {
        joined = waiter => joined.context("evaluation worker wait failed")?,
        _ = tokio::signal::ctrl_c() => {
            console.warn("Interrupted, stopping at the next sample boundary");
            let runner = Arc::clone(&runner);
            tokio::task::spawn_blocking(move || runner.stop())
                .await
                .context("stop failed")?;
        }
    }

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let registry = runner.result_registry();
    runner.close();

    let report = generate_report(&registry, format)?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            console.success(&format!("Report written to {}", path.display()));
        }
        None => println!("{}", report),
    }

    console.info(&format!(
        "{} {} algorithm(s) x {} dataset pair(s)",
        "Evaluation complete:".bold(),
        algorithm_count,
        pair_count
    ));
    Ok(())
}
