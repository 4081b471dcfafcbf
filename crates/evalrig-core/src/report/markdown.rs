//! Markdown report generation

use anyhow::Result;

use super::{format_summary, summary_of, EvalReport};

/// Markdown report generator
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// Generate a Markdown report
    pub fn generate(report: &EvalReport) -> Result<String> {
        let mut md = String::new();

        md.push_str("# Evalrig Evaluation Report\n\n");
        md.push_str(&format!(
            "- **Generated**: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        md.push_str(&format!("- **Algorithms**: {}\n", report.algorithms.len()));
        md.push_str(&format!("- **Metrics**: {}\n\n", report.metric_names.join(", ")));

        let header = format!("| Dataset | {} |\n", report.metric_names.join(" | "));
        let rule = format!("|---------|{}\n", "-------|".repeat(report.metric_names.len()));

        for algorithm in &report.algorithms {
            md.push_str(&format!("## {}\n\n", algorithm.name));
            md.push_str(&header);
            md.push_str(&rule);

            for dataset in &algorithm.datasets {
                let label = match &dataset.locator {
                    Some(locator) => format!("{} ({})", dataset.dataset_id, locator),
                    None => dataset.dataset_id.to_string(),
                };
                let cells: Vec<String> = report
                    .metric_names
                    .iter()
                    .map(|name| format_summary(summary_of(&dataset.metrics, name)))
                    .collect();
                md.push_str(&format!("| {} | {} |\n", label, cells.join(" | ")));
            }

            let cells: Vec<String> = report
                .metric_names
                .iter()
                .map(|name| format_summary(summary_of(&algorithm.mean, name)))
                .collect();
            md.push_str(&format!("| **mean** | {} |\n\n", cells.join(" | ")));
        }

        Ok(md)
    }
}
