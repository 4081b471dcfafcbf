//! Listings of built-in metrics and baseline algorithms

use anyhow::Result;
use colored::*;
use evalrig_core::metrics::{builtin_metric_names, metric_by_name};

use crate::algorithms::BASELINES;
use crate::console::CliConsole;

/// List built-in metrics
pub fn metrics() -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Built-in Metrics");

    for metric in builtin_metric_names().iter().filter_map(|n| metric_by_name(n)) {
        let kind = if metric.is_meta() {
            format!("{} (meta)", metric.kind().display_name())
        } else {
            metric.kind().display_name().to_string()
        };
        println!(
            "  {:<14} {:<18} {}",
            metric.name().cyan().bold(),
            kind.dimmed(),
            metric.description()
        );
    }
    Ok(())
}

/// List baseline algorithms
pub fn algorithms() -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Baseline Algorithms");

    for (name, description) in BASELINES {
        println!("  {:<14} {}", name.cyan().bold(), description);
    }
    Ok(())
}
