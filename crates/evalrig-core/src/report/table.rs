//! Plain-text table for terminal output

use anyhow::Result;

use super::{format_summary, summary_of, EvalReport};

const NAME_WIDTH: usize = 14;
const CELL_WIDTH: usize = 12;

/// Terminal table generator
pub struct TableReporter;

impl TableReporter {
    pub fn generate(report: &EvalReport) -> Result<String> {
        let width = NAME_WIDTH + (CELL_WIDTH + 1) * report.metric_names.len();
        let mut output = String::new();

        output.push_str(&format!("\n{:=<width$}\n", "= Evalrig Evaluation Results ", width = width));
        output.push_str(&format!(
            "Generated: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!("{:=<width$}\n\n", "", width = width));

        let mut header = format!("{:<NAME_WIDTH$}", "Dataset");
        for name in &report.metric_names {
            header.push_str(&format!(" {:>CELL_WIDTH$}", truncate(name, CELL_WIDTH)));
        }

        for algorithm in &report.algorithms {
            output.push_str(&format!("{}\n", algorithm.name.to_uppercase()));
            output.push_str(&format!("{:-<width$}\n", "", width = width));
            output.push_str(&header);
            output.push('\n');
            output.push_str(&format!("{:-<width$}\n", "", width = width));

            for dataset in &algorithm.datasets {
                output.push_str(&format!("{:<NAME_WIDTH$}", dataset.dataset_id));
                for name in &report.metric_names {
                    let cell = format_summary(summary_of(&dataset.metrics, name));
                    output.push_str(&format!(" {:>CELL_WIDTH$}", cell));
                }
                output.push('\n');
            }

            output.push_str(&format!("{:<NAME_WIDTH$}", "mean"));
            for name in &report.metric_names {
                let cell = format_summary(summary_of(&algorithm.mean, name));
                output.push_str(&format!(" {:>CELL_WIDTH$}", cell));
            }
            output.push_str("\n\n");
        }

        output.push_str(&format!("{:=<width$}\n", "", width = width));
        Ok(output)
    }
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let kept: String = name.chars().take(max - 1).collect();
        format!("{}~", kept)
    }
}
